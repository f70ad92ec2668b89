//! Core traits for session storage and agent execution.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Attachment;

/// Session identifier.
pub type SessionId = String;

/// Persisted conversation thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Parent session, set for sub-conversations spawned from a tool call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<SessionId>,
    /// Human readable title.
    pub title: String,
    /// Number of messages exchanged in this session.
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    /// Message holding the latest conversation summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_message_id: Option<String>,
    /// Accumulated cost in USD.
    #[serde(default)]
    pub cost: f64,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

impl Session {
    /// Create a root session with the given id and title.
    #[must_use]
    pub fn new(id: impl Into<SessionId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether this session was spawned from another one.
    #[must_use]
    pub const fn is_child(&self) -> bool {
        self.parent_session_id.is_some()
    }
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session '{0}' not found")]
    NotFound(SessionId),
    #[error("session '{0}' already exists")]
    AlreadyExists(SessionId),
    #[error("{0}")]
    Backend(String),
}

/// Trait for session storage backends.
///
/// The session context only relies on `create` and `get`; the remaining
/// operations serve the rest of the application.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new root session.
    async fn create(&self, title: &str) -> Result<Session, StorageError>;

    /// Create a child session for a tool call. The tool call id becomes the session id.
    async fn create_task_session(
        &self,
        tool_call_id: &str,
        parent_session_id: &str,
        title: &str,
    ) -> Result<Session, StorageError>;

    /// Create the child session used to generate a title for `parent_session_id`.
    async fn create_title_session(&self, parent_session_id: &str) -> Result<Session, StorageError>;

    /// Get a session by ID.
    async fn get(&self, id: &str) -> Result<Session, StorageError>;

    /// List root sessions, newest first.
    async fn list(&self) -> Result<Vec<Session>, StorageError>;

    /// Replace a stored session, returning the persisted copy.
    async fn save(&self, session: Session) -> Result<Session, StorageError>;

    /// Delete a session and its children.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;
}

/// Event emitted by a running agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Assistant response for the run.
    Response { session_id: SessionId, text: String },
    /// Progress of a conversation summary.
    Summarize {
        session_id: SessionId,
        progress: String,
        done: bool,
    },
    /// The run failed after it was started.
    Error { session_id: SessionId, message: String },
}

/// Stream of agent events for one run.
pub type AgentEventStream = BoxStream<'static, AgentEvent>;

/// Agent run error.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("session {0} is currently processing another request")]
    SessionBusy(SessionId),
    #[error("{0}")]
    Failed(String),
}

/// Trait for agents that execute user messages.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Start a run within `session_id`.
    ///
    /// Returns as soon as the run is accepted; events arrive on the stream.
    async fn run(
        &self,
        session_id: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<AgentEventStream, RunError>;
}
