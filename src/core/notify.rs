//! Notification surface used by the gateway and table editors.
//!
//! The core only needs a synchronous "show this, tell me what the operator
//! answered" call. How a notice is presented belongs to the implementor:
//! the terminal UI draws a modal popup, the console notifier writes to
//! stderr, and the recorder keeps notices in memory with scripted answers.
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::{error, info, warn};

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    /// Startup cannot continue.
    Fatal,
    /// A statement was rejected by the database.
    StatementFailed,
    /// A required form field is blank.
    MissingData,
    /// Update or delete was requested with no row selected.
    NoRowChosen,
    /// A yes/no question.
    Confirm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice::new(NoticeKind::Confirm, title, message)
    }
}

/// The operator's answer to a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Acknowledged,
    Yes,
    No,
}

pub trait Notifier {
    /// Presents `notice` and blocks until the operator answers.
    ///
    /// Confirmations answer `Yes` or `No`; every other kind answers
    /// `Acknowledged`.
    fn notify(&self, notice: &Notice) -> Response;
}

/// Writes notices to stderr and the log. Confirmations are always declined,
/// so nothing destructive happens without an interactive operator.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) -> Response {
        match notice.kind {
            NoticeKind::Fatal | NoticeKind::StatementFailed => {
                error!(title = %notice.title, "{}", notice.message)
            }
            NoticeKind::MissingData | NoticeKind::NoRowChosen => {
                warn!(title = %notice.title, "{}", notice.message)
            }
            NoticeKind::Info | NoticeKind::Confirm => {
                info!(title = %notice.title, "{}", notice.message)
            }
        }
        eprintln!("[{}] {}", notice.title, notice.message);
        match notice.kind {
            NoticeKind::Confirm => Response::No,
            _ => Response::Acknowledged,
        }
    }
}

/// Keeps every notice it is shown and answers confirmations from a queue.
///
/// When the queue is empty confirmations are declined.
#[derive(Debug, Default)]
pub struct Recorder {
    notices: RefCell<Vec<Notice>>,
    answers: RefCell<VecDeque<bool>>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder::default()
    }

    /// Queues the answer for the next confirmation.
    pub fn answer(&self, yes: bool) {
        self.answers.borrow_mut().push_back(yes);
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.borrow().iter().map(|n| n.kind).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.notices.borrow_mut().clear();
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: &Notice) -> Response {
        self.notices.borrow_mut().push(notice.clone());
        match notice.kind {
            NoticeKind::Confirm => match self.answers.borrow_mut().pop_front() {
                Some(true) => Response::Yes,
                _ => Response::No,
            },
            _ => Response::Acknowledged,
        }
    }
}
