//! UI events produced by the dispatch pipeline.

use coder_chat_core::Session;
use serde::{Deserialize, Serialize};

/// Severity of an informational message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum InfoType {
    Info = 0,
    Warn = 1,
    Error = 2,
}

/// Status line notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoMsg {
    pub kind: InfoType,
    pub msg: String,
}

impl InfoMsg {
    /// Informational notification.
    #[must_use]
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            kind: InfoType::Info,
            msg: msg.into(),
        }
    }

    /// Warning notification.
    #[must_use]
    pub fn warn(msg: impl Into<String>) -> Self {
        Self {
            kind: InfoType::Warn,
            msg: msg.into(),
        }
    }

    /// Error-class notification.
    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            kind: InfoType::Error,
            msg: msg.into(),
        }
    }
}

/// Event handed to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The given session is now the active one.
    SessionSelected { session: Session },
    /// Notification for the status line.
    Info(InfoMsg),
}

/// Deferred unit of UI work, invoked later by the front-end's action loop.
pub type Action = Box<dyn FnOnce() -> UiEvent + Send>;

/// Action selecting `session`.
#[must_use]
pub fn session_selected(session: Session) -> Action {
    Box::new(move || UiEvent::SessionSelected { session })
}

/// Action reporting an error-class notification.
#[must_use]
pub fn report_error(msg: impl Into<String>) -> Action {
    let info = InfoMsg::error(msg);
    Box::new(move || UiEvent::Info(info))
}
