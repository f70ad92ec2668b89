//! Message dispatch for the interactive front-end.
//!
//! Provides:
//! - `on_send_message` - Run the coder agent for an outbound message
//! - UI events and deferred actions
//! - `ActionDriver` - Plays deferred actions into the front-end loop

pub mod dispatch;
pub mod driver;
pub mod event;

pub use dispatch::{DispatchError, Dispatched, on_send_message};
pub use driver::{ActionDriver, SendError};
pub use event::{Action, InfoMsg, InfoType, UiEvent};
