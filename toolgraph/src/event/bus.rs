use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use crate::graph::logging;
use crate::state::StateMap;

use super::{EventListener, EventSink, EventType, ListenerError, WorkflowEvent};

/// Listener backed by a synchronous closure.
pub struct FnListener<F> {
    f: F,
}

impl<F> FnListener<F>
where
    F: Fn(&WorkflowEvent) -> Result<(), ListenerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> EventListener for FnListener<F>
where
    F: Fn(&WorkflowEvent) -> Result<(), ListenerError> + Send + Sync,
{
    async fn on_event(&self, event: &WorkflowEvent) -> Result<(), ListenerError> {
        (self.f)(event)
    }
}

/// Ordered list of listeners, each invoked in turn with a per-listener timeout.
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
    timeout: Duration,
}

impl EventBus {
    pub fn new(timeout: Duration) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            timeout,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Delivers `event` to every listener. Failures, panics and timeouts are logged.
    pub async fn publish(&self, event: &WorkflowEvent) {
        let listeners: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let name = event.event_type.as_str();
        for listener in listeners {
            let call = AssertUnwindSafe(listener.on_event(event)).catch_unwind();
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => logging::log_listener_error(name, &e.to_string()),
                Ok(Err(_)) => logging::log_listener_error(name, "listener panicked"),
                Err(_) => logging::log_listener_timeout(name),
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event_type: EventType, data: StateMap) {
        self.publish(&WorkflowEvent::new(event_type, data)).await;
    }
}
