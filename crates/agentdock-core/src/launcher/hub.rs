//! Fan-out of launch output to subscribers
//!
//! Every subscriber owns an unbounded queue, so a slow reader only grows its
//! own backlog and never loses events.

use crate::types::OutputEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct OutputHub {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<OutputEvent>>>>,
}

impl OutputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. It sees events published from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<OutputEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        subscribers.push(tx);
        debug!("Output subscriber attached ({} total)", subscribers.len());
        rx
    }

    /// Deliver `event` to every live subscriber, forgetting detached ones
    pub fn publish(&self, event: OutputEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
