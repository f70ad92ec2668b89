//! In-memory session storage.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use coder_chat_core::traits::{Session, SessionId, SessionRepository, StorageError};
use uuid::Uuid;

/// Title given to sessions that generate a title for their parent.
const TITLE_SESSION_TITLE: &str = "Generate a title";

/// In-memory session repository.
///
/// Useful for development and single-process deployments.
/// Data is lost on restart.
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionRepository {
    /// Create a new in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn insert(&self, session: Session) -> Result<Session, StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if sessions.contains_key(&session.id) {
            return Err(StorageError::AlreadyExists(session.id));
        }
        sessions.insert(session.id.clone(), session.clone());

        Ok(session)
    }
}

impl Default for MemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn new_session(id: SessionId, parent_session_id: Option<SessionId>, title: &str) -> Session {
    let timestamp = now();
    Session {
        id,
        parent_session_id,
        title: title.to_string(),
        created_at: timestamp,
        updated_at: timestamp,
        ..Session::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, title: &str) -> Result<Session, StorageError> {
        self.insert(new_session(Uuid::new_v4().to_string(), None, title))
    }

    async fn create_task_session(
        &self,
        tool_call_id: &str,
        parent_session_id: &str,
        title: &str,
    ) -> Result<Session, StorageError> {
        self.insert(new_session(
            tool_call_id.to_string(),
            Some(parent_session_id.to_string()),
            title,
        ))
    }

    async fn create_title_session(&self, parent_session_id: &str) -> Result<Session, StorageError> {
        self.insert(new_session(
            format!("title-{parent_session_id}"),
            Some(parent_session_id.to_string()),
            TITLE_SESSION_TITLE,
        ))
    }

    async fn get(&self, id: &str) -> Result<Session, StorageError> {
        self.sessions
            .read()
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Session>, StorageError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut result: Vec<Session> = sessions
            .values()
            .filter(|s| !s.is_child())
            .cloned()
            .collect();

        // Sort by created_at descending
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result)
    }

    async fn save(&self, mut session: Session) -> Result<Session, StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let stored = sessions
            .get_mut(&session.id)
            .ok_or_else(|| StorageError::NotFound(session.id.clone()))?;

        session.created_at = stored.created_at;
        session.updated_at = now();
        *stored = session.clone();

        Ok(session)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if sessions.remove(id).is_none() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        sessions.retain(|_, s| s.parent_session_id.as_deref() != Some(id));

        Ok(())
    }
}
