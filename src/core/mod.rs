/// Core Module for TUICRUD
///
/// This module contains the components every table tab shares: the
/// connection gateway and statement builders, the notification surface,
/// and the error type.

pub mod db;
pub mod error;
pub mod notify;

// Re-export commonly used types for convenience
pub use error::{CrudError, Result};
pub use notify::{Notice, NoticeKind, Notifier, Response};
