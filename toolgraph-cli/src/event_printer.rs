//! Event listener that prints one line per workflow event.

use async_trait::async_trait;
use serde_json::Value;

use toolgraph::{EventListener, ListenerError, WorkflowEvent};

/// Prints events to stderr so that the final state on stdout can be redirected separately.
pub struct EventPrinter {
    verbose: bool,
}

impl EventPrinter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl EventListener for EventPrinter {
    async fn on_event(&self, event: &WorkflowEvent) -> Result<(), ListenerError> {
        eprintln!("{}", format_event(event, self.verbose));
        Ok(())
    }
}

/// `[event] node_completed node=split_text`; verbose adds the full payload.
pub fn format_event(event: &WorkflowEvent, verbose: bool) -> String {
    let mut line = format!("[event] {}", event.event_type);
    if let Some(node) = event.data.get("node_id").and_then(Value::as_str) {
        line.push_str(&format!(" node={}", node));
    }
    if let Some(error) = event.data.get("error").and_then(Value::as_str) {
        line.push_str(&format!(" error={}", error));
    }
    if verbose {
        line.push_str(&format!(" data={}", Value::Object(event.data.clone())));
    }
    line
}
