//! Core entities and capability traits for coding-assistant chat sessions.
//!
//! This crate provides the shared vocabulary:
//! - `Session` - A persisted conversation thread
//! - `Message` / `Attachment` - Outbound user message payloads
//! - `SessionRepository` and `AgentRunner` capability traits
//! - `ContextConfig` - Settings for the session context

pub mod config;
pub mod message;
pub mod traits;

pub use config::ContextConfig;
pub use message::{Attachment, Message};
pub use traits::{
    AgentEvent, AgentEventStream, AgentRunner, RunError, Session, SessionId, SessionRepository,
    StorageError,
};
