//! Builds registry, store and engine for one [`RunConfig`] and runs its graph.

use std::sync::Arc;

use toolgraph::{
    register_llm_tools, register_text_tools, ToolRegistry, WorkflowEngine, WorkflowRun, WorkflowStore,
};

use crate::config::{Error, RunConfig};
use crate::event_printer::EventPrinter;

#[cfg(feature = "sqlite")]
fn open_store(path: &str) -> Result<Arc<dyn WorkflowStore>, Error> {
    Ok(Arc::new(toolgraph::SqliteWorkflowStore::open(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_store(path: &str) -> Result<Arc<dyn WorkflowStore>, Error> {
    Err(format!("cannot persist to {}: built without the sqlite feature", path).into())
}

/// Runs the configured graph and returns the finished run.
///
/// A run that fails inside the graph is returned with `status = failed`, not as `Err`;
/// `Err` means the run could not be started (bad definition, unreadable file, store).
pub async fn run_with_config(config: &RunConfig) -> Result<WorkflowRun, Error> {
    let definition = config.load_definition()?;

    let mut tools = ToolRegistry::new();
    register_text_tools(&mut tools);
    register_llm_tools(&mut tools, config.llm.build());
    let mut engine = WorkflowEngine::new(Arc::new(tools));
    if let Some(path) = &config.db_path {
        engine = engine.with_store(open_store(path)?);
    }
    engine.add_event_listener(Arc::new(EventPrinter::new(config.verbose)));

    let graph_id = engine.create_graph(definition).await?;
    match engine
        .run_workflow(&graph_id, config.initial_state.clone())
        .await
    {
        Ok(run) => Ok(run),
        Err(e) => match engine.list_runs(Some(&graph_id)).await.into_iter().next() {
            Some(run) => Ok(run),
            None => Err(e.into()),
        },
    }
}
