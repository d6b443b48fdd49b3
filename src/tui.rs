//! Terminal setup and the modal notifier.
//!
//! [`Tui`] owns the ratatui terminal: raw mode and the alternate screen are
//! entered on creation and left on [`Tui::restore`] or drop. It remembers the
//! last full frame so a modal notice can be painted over it.
use crate::core::{Notice, NoticeKind, Notifier, Response, Result};
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal};
use std::cell::RefCell;
use std::io::{self, Stdout};
use std::rc::Rc;
use tracing::error;

pub type TermBackend = CrosstermBackend<Stdout>;

pub struct Tui {
    terminal: Terminal<TermBackend>,
    backdrop: Option<Buffer>,
    active: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Tui {
            terminal,
            backdrop: None,
            active: true,
        })
    }

    /// Draws a full application frame and keeps it as the modal backdrop.
    pub fn draw<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut Frame<TermBackend>),
    {
        let completed = self.terminal.draw(render)?;
        self.backdrop = Some(completed.buffer.clone());
        Ok(())
    }

    /// Shows `notice` over the last frame until the operator answers it.
    pub fn modal(&mut self, notice: &Notice) -> Result<Response> {
        loop {
            let backdrop = &self.backdrop;
            self.terminal.draw(|f| {
                if let Some(buffer) = backdrop {
                    f.render_widget(Backdrop(buffer), f.size());
                }
                draw_notice(f, notice);
            })?;

            if let Event::Key(key) = event::read()? {
                if let Some(response) = answer(notice.kind, key.code) {
                    return Ok(response);
                }
            }
        }
    }

    /// Leaves raw mode and the alternate screen. Safe to call twice.
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            error!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Maps a key press to the operator's answer, if it is one.
pub fn answer(kind: NoticeKind, code: KeyCode) -> Option<Response> {
    match (kind, code) {
        (NoticeKind::Confirm, KeyCode::Char('y') | KeyCode::Char('Y')) => Some(Response::Yes),
        (NoticeKind::Confirm, KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc) => {
            Some(Response::No)
        }
        (NoticeKind::Confirm, _) => None,
        (_, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) => Some(Response::Acknowledged),
        _ => None,
    }
}

/// Presents notices as modal popups on the shared terminal.
pub struct TerminalNotifier {
    tui: Rc<RefCell<Tui>>,
}

impl TerminalNotifier {
    pub fn new(tui: Rc<RefCell<Tui>>) -> Self {
        TerminalNotifier { tui }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) -> Response {
        match self.tui.borrow_mut().modal(notice) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, title = %notice.title, "Could not show notice");
                match notice.kind {
                    NoticeKind::Confirm => Response::No,
                    _ => Response::Acknowledged,
                }
            }
        }
    }
}

/// Repaints a previously completed frame.
struct Backdrop<'a>(&'a Buffer);

impl Widget for Backdrop<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.0.area == area {
            buf.merge(self.0);
        }
    }
}

fn notice_color(kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Fatal | NoticeKind::StatementFailed => Color::Red,
        NoticeKind::MissingData | NoticeKind::NoRowChosen => Color::Yellow,
        NoticeKind::Confirm => Color::Magenta,
        NoticeKind::Info => Color::Cyan,
    }
}

fn draw_notice<B: Backend>(f: &mut Frame<B>, notice: &Notice) {
    let area = centered_rect(60, 50, f.size());
    let color = notice_color(notice.kind);
    let hint = match notice.kind {
        NoticeKind::Confirm => "[y] yes   [n] no",
        _ => "[Enter] OK",
    };

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", notice.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(inner);

    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(notice.message.as_str()).wrap(Wrap { trim: false }),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Spans::from(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        )))
        .alignment(Alignment::Center),
        chunks[1],
    );
}

/// A rectangle of the given percentage size centred in `r`.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
