//! Server settings read from the environment (after `.env` is loaded).

use std::sync::Arc;

use toolgraph::{InMemoryWorkflowStore, SqliteWorkflowStore, StoreError, WorkflowStore};

/// `DB_PATH` value that selects the non-durable in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `LISTEN`, default `0.0.0.0:8000`.
    pub listen: String,
    /// `DB_PATH`, default `workflow.db`.
    pub db_path: String,
    /// `REGISTER_DEMO_WORKFLOWS`, default on. Registers the summarization pipeline at startup.
    pub register_demo_workflows: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let register_demo_workflows = lookup("REGISTER_DEMO_WORKFLOWS")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);
        Self {
            listen: lookup("LISTEN").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            db_path: lookup("DB_PATH")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "workflow.db".to_string()),
            register_demo_workflows,
        }
    }

    /// Opens the store named by `db_path`.
    pub fn open_store(&self) -> Result<Arc<dyn WorkflowStore>, StoreError> {
        if self.db_path == IN_MEMORY_DB {
            return Ok(Arc::new(InMemoryWorkflowStore::new()));
        }
        Ok(Arc::new(SqliteWorkflowStore::open(&self.db_path)?))
    }
}
