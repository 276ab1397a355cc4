use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use super::{EventListener, ListenerError, WorkflowEvent};

/// Forwards events into a `tokio::sync::broadcast` channel.
///
/// Sending never waits: a lagging subscriber loses old events instead of slowing the run.
/// Having no subscribers is not an error.
#[derive(Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl BroadcastListener {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Subscribes and wraps the receiver as a `Stream`.
    pub fn stream(&self) -> BroadcastStream<WorkflowEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }
}

impl Default for BroadcastListener {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventListener for BroadcastListener {
    async fn on_event(&self, event: &WorkflowEvent) -> Result<(), ListenerError> {
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}
