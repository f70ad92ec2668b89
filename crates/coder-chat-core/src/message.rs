//! Outbound chat message payloads.

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// File or snippet attached to a message.
///
/// The content is passed through to the agent untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl Attachment {
    /// Create an attachment, deriving the file name from the path.
    #[must_use]
    pub fn new(file_path: impl Into<PathBuf>, mime_type: impl Into<String>, content: Bytes) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_path,
            file_name,
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// Message typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a text-only message.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Add an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}
