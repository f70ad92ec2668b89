//! Outbound message dispatch.

use coder_chat_core::{AgentEventStream, Message};
use coder_chat_session::{ContextError, ConversationContext};
use thiserror::Error;
use tracing::{info, warn};

use crate::event::{Action, report_error, session_selected};

/// Dispatch error.
///
/// Agent run failures are not errors here; they become notifications.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("coder agent is not configured")]
    AgentNotConfigured,
}

/// Outcome of a dispatched message.
pub struct Dispatched {
    /// Deferred UI actions, in the order they must be run.
    pub actions: Vec<Action>,
    /// Event stream of the started run. `None` when the agent rejected it.
    pub events: Option<AgentEventStream>,
}

/// Run the coder agent for `message` within the current session.
///
/// The first action always selects the resolved session. A rejected run
/// appends an error notification carrying the run error's message.
///
/// # Errors
/// Returns error if the current session cannot be resolved or no coder
/// agent is configured. The agent is not run in either case.
pub async fn on_send_message<C>(ctx: &mut C, message: Message) -> Result<Dispatched, DispatchError>
where
    C: ConversationContext + ?Sized,
{
    let session = ctx.resolve_current_session().await?;

    let Some(agent) = ctx.coder_agent() else {
        warn!(session_id = %session.id, "No coder agent configured, message not sent");
        return Err(DispatchError::AgentNotConfigured);
    };

    info!(
        session_id = %session.id,
        attachments = message.attachments.len(),
        "Running coder agent"
    );
    let run = agent
        .run(&session.id, &message.text, message.attachments)
        .await;

    let mut actions = Vec::with_capacity(2);
    actions.push(session_selected(session));

    let events = match run {
        Ok(events) => Some(events),
        Err(e) => {
            warn!(error = %e, "Coder agent rejected run");
            actions.push(report_error(e.to_string()));
            None
        }
    };

    Ok(Dispatched { actions, events })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use coder_chat_core::{AgentEvent, AgentRunner, Attachment, RunError, Session, StorageError};
    use futures::StreamExt;

    use super::*;
    use crate::event::{InfoMsg, InfoType, UiEvent};

    #[derive(Default)]
    struct MockAgentRunner {
        id_of_session_ran_within: Mutex<Option<String>>,
        ran_with_msg_text: Mutex<Option<String>>,
        ran_with_attachments: Mutex<Option<Vec<Attachment>>>,
        err_on_run: Option<String>,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl AgentRunner for MockAgentRunner {
        async fn run(
            &self,
            session_id: &str,
            content: &str,
            attachments: Vec<Attachment>,
        ) -> Result<AgentEventStream, RunError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            *self.id_of_session_ran_within.lock().unwrap() = Some(session_id.to_string());
            *self.ran_with_msg_text.lock().unwrap() = Some(content.to_string());
            *self.ran_with_attachments.lock().unwrap() = Some(attachments);

            if let Some(e) = &self.err_on_run {
                return Err(RunError::Failed(e.clone()));
            }
            let event = AgentEvent::Response {
                session_id: session_id.to_string(),
                text: "ack".to_string(),
            };
            Ok(futures::stream::iter(vec![event]).boxed())
        }
    }

    struct MockContext {
        current_session: Session,
        resolve_err: Option<String>,
        runner: Option<Arc<MockAgentRunner>>,
    }

    impl MockContext {
        fn new(current_session: Session, runner: Option<Arc<MockAgentRunner>>) -> Self {
            Self {
                current_session,
                resolve_err: None,
                runner,
            }
        }
    }

    #[async_trait]
    impl ConversationContext for MockContext {
        fn coder_agent(&self) -> Option<Arc<dyn AgentRunner>> {
            self.runner
                .clone()
                .map(|r| r as Arc<dyn AgentRunner>)
        }

        async fn make_session_current(&mut self, _id: &str) -> Result<(), ContextError> {
            unimplemented!("not used by dispatch")
        }

        async fn resolve_current_session(&mut self) -> Result<Session, ContextError> {
            match &self.resolve_err {
                Some(e) => Err(ContextError::Create(StorageError::Backend(e.clone()))),
                None => Ok(self.current_session.clone()),
            }
        }
    }

    fn chat_session() -> Session {
        Session::new("test-chat-session", "New Session")
    }

    #[tokio::test]
    async fn test_runs_agent_with_message_data() {
        let runner = Arc::new(MockAgentRunner::default());
        let mut ctx = MockContext::new(chat_session(), Some(Arc::clone(&runner)));

        let dispatched = on_send_message(&mut ctx, Message::new("Fake message for test"))
            .await
            .unwrap();

        let mut actions = dispatched.actions;
        assert_eq!(actions.len(), 1);
        let selected = actions.remove(0)();
        assert_eq!(
            selected,
            UiEvent::SessionSelected {
                session: chat_session()
            }
        );

        assert_eq!(
            runner.id_of_session_ran_within.lock().unwrap().as_deref(),
            Some("test-chat-session")
        );
        assert_eq!(
            runner.ran_with_msg_text.lock().unwrap().as_deref(),
            Some("Fake message for test")
        );
        assert!(
            runner
                .ran_with_attachments
                .lock()
                .unwrap()
                .as_ref()
                .is_some_and(Vec::is_empty)
        );

        let events: Vec<AgentEvent> = dispatched.events.unwrap().collect().await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_agent_fails_to_run() {
        let runner = Arc::new(MockAgentRunner {
            err_on_run: Some("test err agent failed to run".to_string()),
            ..MockAgentRunner::default()
        });
        let mut ctx = MockContext::new(chat_session(), Some(Arc::clone(&runner)));

        let dispatched = on_send_message(&mut ctx, Message::new("Fake message for test"))
            .await
            .unwrap();
        assert!(dispatched.events.is_none());

        let events: Vec<UiEvent> = dispatched.actions.into_iter().map(|a| a()).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], UiEvent::SessionSelected { .. }));
        assert_eq!(
            events[1],
            UiEvent::Info(InfoMsg {
                kind: InfoType::Error,
                msg: "test err agent failed to run".to_string(),
            })
        );
        assert_eq!(
            runner.id_of_session_ran_within.lock().unwrap().as_deref(),
            Some("test-chat-session")
        );
    }

    #[tokio::test]
    async fn test_attachments_passed_through() {
        let runner = Arc::new(MockAgentRunner::default());
        let mut ctx = MockContext::new(chat_session(), Some(Arc::clone(&runner)));
        let attachment = Attachment::new("src/main.rs", "text/plain", "fn main() {}".into());

        on_send_message(
            &mut ctx,
            Message::new("explain").with_attachment(attachment.clone()),
        )
        .await
        .unwrap();

        assert_eq!(
            runner.ran_with_attachments.lock().unwrap().clone(),
            Some(vec![attachment])
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_does_not_run_agent() {
        let runner = Arc::new(MockAgentRunner::default());
        let mut ctx = MockContext {
            resolve_err: Some("disk full".to_string()),
            ..MockContext::new(chat_session(), Some(Arc::clone(&runner)))
        };

        let err = on_send_message(&mut ctx, Message::new("hi"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "failed to create session: disk full");
        assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_agent_is_reported() {
        let mut ctx = MockContext::new(chat_session(), None);

        let err = on_send_message(&mut ctx, Message::new("hi"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::AgentNotConfigured));
    }

    #[tokio::test]
    async fn test_missing_agent_still_creates_session() {
        use coder_chat_core::SessionRepository;
        use coder_chat_session::{SessionContext, storage::MemorySessionRepository};

        let repo = Arc::new(MemorySessionRepository::new());
        let mut ctx = SessionContext::new(Arc::clone(&repo));

        let err = on_send_message(&mut ctx, Message::new("hi"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::AgentNotConfigured));

        let sessions = repo.list().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(ctx.current().session(), Some(&sessions[0]));

        // a second attempt reuses the memoized session
        assert!(on_send_message(&mut ctx, Message::new("again")).await.is_err());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_with_memory_backed_context() {
        use coder_chat_core::SessionRepository;
        use coder_chat_session::{SessionContext, storage::MemorySessionRepository};

        let repo = Arc::new(MemorySessionRepository::new());
        let runner = Arc::new(MockAgentRunner::default());
        let mut ctx = SessionContext::new(Arc::clone(&repo)).with_coder_agent(runner.clone());

        let first = on_send_message(&mut ctx, Message::new("one")).await.unwrap();
        let second = on_send_message(&mut ctx, Message::new("two")).await.unwrap();

        let first_selected = first.actions.into_iter().next().unwrap()();
        let second_selected = second.actions.into_iter().next().unwrap()();
        assert_eq!(first_selected, second_selected);

        let sessions = repo.list().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "New Session");
        assert_eq!(runner.runs.load(Ordering::SeqCst), 2);
        assert_eq!(
            runner.id_of_session_ran_within.lock().unwrap().as_deref(),
            Some(sessions[0].id.as_str())
        );
    }
}
