//! Current-session context and session storage.
//!
//! Provides:
//! - `SessionContext` - Memoized "which session am I in" state
//! - Storage implementations (memory)

pub mod context;
pub mod storage;

pub use context::{ContextError, ConversationContext, CurrentSession, SessionContext};
