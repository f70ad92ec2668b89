//! Memoized current-session state for an interactive run.

use std::sync::Arc;

use async_trait::async_trait;
use coder_chat_core::{
    ContextConfig,
    traits::{AgentRunner, Session, SessionRepository, StorageError},
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Session context error.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to create session: {0}")]
    Create(#[source] StorageError),
    #[error("unable to load session '{id}' from storage: {source}")]
    Load {
        id: String,
        #[source]
        source: StorageError,
    },
}

/// Which session is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CurrentSession {
    /// No session has been created or loaded yet.
    #[default]
    Unresolved,
    /// A session was created or explicitly loaded.
    Resolved(Session),
}

impl CurrentSession {
    /// The cached session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Unresolved => None,
            Self::Resolved(session) => Some(session),
        }
    }

    fn is(&self, id: &str) -> bool {
        self.session().is_some_and(|s| s.id == id)
    }
}

/// Operations the front-end needs from a session context.
///
/// Implementations are single-writer: mutation goes through `&mut self`.
#[async_trait]
pub trait ConversationContext: Send {
    /// The bound coder agent, if one is configured.
    fn coder_agent(&self) -> Option<Arc<dyn AgentRunner>>;

    /// Switch to the session with the given id.
    async fn make_session_current(&mut self, id: &str) -> Result<(), ContextError>;

    /// Return the current session, creating one on first use.
    async fn resolve_current_session(&mut self) -> Result<Session, ContextError>;
}

/// Session context backed by a session repository.
///
/// Holds a read-cached copy of the active session. The repository and the
/// agent are shared with the rest of the application and never closed here.
pub struct SessionContext<R>
where
    R: SessionRepository + ?Sized,
{
    repository: Arc<R>,
    config: ContextConfig,
    current: CurrentSession,
    coder_agent: Option<Arc<dyn AgentRunner>>,
}

impl<R> SessionContext<R>
where
    R: SessionRepository + ?Sized,
{
    /// Create an unresolved context with the default configuration.
    #[must_use]
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_config(repository, ContextConfig::default())
    }

    /// Create an unresolved context with the given configuration.
    #[must_use]
    pub fn with_config(repository: Arc<R>, config: ContextConfig) -> Self {
        Self {
            repository,
            config,
            current: CurrentSession::Unresolved,
            coder_agent: None,
        }
    }

    /// Bind a coder agent.
    #[must_use]
    pub fn with_coder_agent(mut self, agent: Arc<dyn AgentRunner>) -> Self {
        self.coder_agent = Some(agent);
        self
    }

    /// Bind or replace the coder agent.
    pub fn set_coder_agent(&mut self, agent: Arc<dyn AgentRunner>) {
        self.coder_agent = Some(agent);
    }

    /// Unbind the coder agent.
    pub fn clear_coder_agent(&mut self) {
        self.coder_agent = None;
    }

    /// Current cache state.
    #[must_use]
    pub const fn current(&self) -> &CurrentSession {
        &self.current
    }

    /// The bound coder agent, if one is configured.
    #[must_use]
    pub fn coder_agent(&self) -> Option<Arc<dyn AgentRunner>> {
        self.coder_agent.clone()
    }

    /// Return the current session, creating one on first use.
    ///
    /// A cached session is returned without touching storage.
    ///
    /// # Errors
    /// Returns error if the repository fails to create the session. The
    /// context stays unresolved so a later call retries.
    pub async fn resolve_current_session(&mut self) -> Result<Session, ContextError> {
        if let CurrentSession::Resolved(session) = &self.current {
            debug!(session_id = %session.id, "Current session already resolved");
            return Ok(session.clone());
        }

        let session = self
            .repository
            .create(&self.config.default_session_title)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create session");
                ContextError::Create(e)
            })?;

        info!(session_id = %session.id, "Created session");
        self.current = CurrentSession::Resolved(session.clone());

        Ok(session)
    }

    /// Switch to the session with the given id.
    ///
    /// Switching to the already-current session is a no-op.
    ///
    /// # Errors
    /// Returns error if the repository fails to load the session. The
    /// previously cached session is left in place.
    pub async fn make_session_current(&mut self, id: &str) -> Result<(), ContextError> {
        if self.current.is(id) {
            debug!(session_id = id, "Session already current");
            return Ok(());
        }

        let session = self.repository.get(id).await.map_err(|source| {
            warn!(session_id = id, error = %source, "Failed to load session");
            ContextError::Load {
                id: id.to_string(),
                source,
            }
        })?;

        info!(session_id = %session.id, "Switched session");
        self.current = CurrentSession::Resolved(session);

        Ok(())
    }
}

#[async_trait]
impl<R> ConversationContext for SessionContext<R>
where
    R: SessionRepository + ?Sized,
{
    fn coder_agent(&self) -> Option<Arc<dyn AgentRunner>> {
        Self::coder_agent(self)
    }

    async fn make_session_current(&mut self, id: &str) -> Result<(), ContextError> {
        Self::make_session_current(self, id).await
    }

    async fn resolve_current_session(&mut self) -> Result<Session, ContextError> {
        Self::resolve_current_session(self).await
    }
}
