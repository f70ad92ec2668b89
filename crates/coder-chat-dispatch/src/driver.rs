//! Bridge between deferred actions and the front-end's event loop.

use tokio::sync::mpsc;

use crate::event::{Action, UiEvent};

/// Runs deferred actions and forwards their events to the front-end.
pub struct ActionDriver {
    event_tx: mpsc::UnboundedSender<UiEvent>,
}

impl ActionDriver {
    /// Create a new driver.
    ///
    /// Returns the driver and the receiver the front-end polls.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }

    /// Invoke `actions` in order, forwarding each event.
    ///
    /// Returns the number of events forwarded.
    ///
    /// # Errors
    /// Returns error if the front-end dropped its receiver. Remaining
    /// actions are not invoked.
    pub fn run(&self, actions: Vec<Action>) -> Result<usize, SendError> {
        let mut sent = 0;
        for action in actions {
            self.send(action())?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Forward a single event.
    ///
    /// # Errors
    /// Returns error if the front-end dropped its receiver.
    pub fn send(&self, event: UiEvent) -> Result<(), SendError> {
        self.event_tx
            .send(event)
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Whether the front-end is still listening.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.event_tx.is_closed()
    }
}

/// Send error.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Channel closed")]
    ChannelClosed,
}
