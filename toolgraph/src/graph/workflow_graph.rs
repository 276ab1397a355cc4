//! Validated workflow graph and its single-path traversal.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use crate::error::WorkflowError;
use crate::event::{event_data, EventType};
use crate::state::{NodeExecution, SharedRun, StateMap, WorkflowState};

use super::condition::Condition;
use super::definition::GraphDefinition;
use super::logging;
use super::params::resolve_params;
use super::RunContext;

/// One step: call `tool_name` with `params` (after `$state.` resolution).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub tool_name: String,
    pub params: StateMap,
    pub description: String,
}

/// Directed transition, taken when `condition` is absent or holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from_node: String,
    pub to_node: String,
    pub condition: Option<Condition>,
}

/// Immutable graph built once from a [`GraphDefinition`].
///
/// Edge endpoints are not checked against the node table; a dangling edge fails the run
/// with [`WorkflowError::NodeNotFound`] when traversal reaches it.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
    start_node: Option<String>,
    description: String,
    definition: GraphDefinition,
}

impl WorkflowGraph {
    /// Validates `definition` and builds the graph. Nothing is executed.
    ///
    /// Fails with [`WorkflowError::Definition`] when a node lacks `id`/`tool`, an edge lacks
    /// `from`/`to`, a condition lacks `type`/`key`, or two nodes share an id. Without an
    /// explicit start node, the first node in definition order is used.
    pub fn from_definition(definition: GraphDefinition) -> Result<Self, WorkflowError> {
        let mut nodes = HashMap::with_capacity(definition.nodes.len());
        let mut first_node = None;
        for (i, spec) in definition.nodes.iter().enumerate() {
            let id = spec
                .id
                .clone()
                .ok_or_else(|| WorkflowError::Definition(format!("node #{} is missing 'id'", i)))?;
            let tool_name = spec.tool.clone().ok_or_else(|| {
                WorkflowError::Definition(format!("node '{}' is missing 'tool'", id))
            })?;
            if nodes.contains_key(&id) {
                return Err(WorkflowError::Definition(format!("duplicate node id '{}'", id)));
            }
            first_node.get_or_insert_with(|| id.clone());
            nodes.insert(
                id.clone(),
                Node {
                    id,
                    tool_name,
                    params: spec.params.clone(),
                    description: spec.description.clone(),
                },
            );
        }

        let mut edges = Vec::with_capacity(definition.edges.len());
        for (i, spec) in definition.edges.iter().enumerate() {
            let (Some(from_node), Some(to_node)) = (spec.from.clone(), spec.to.clone()) else {
                return Err(WorkflowError::Definition(format!(
                    "edge #{} requires 'from' and 'to'",
                    i
                )));
            };
            let condition = spec.condition.as_ref().map(Condition::compile).transpose()?;
            edges.push(Edge {
                from_node,
                to_node,
                condition,
            });
        }

        let start_node = definition.start_node.clone().or(first_node);
        Ok(Self {
            nodes,
            edges,
            start_node,
            description: definition.description.clone(),
            definition,
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &HashMap<String, Node> {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn start_node(&self) -> Option<&str> {
        self.start_node.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The definition this graph was built from, for persistence and display.
    pub fn definition(&self) -> &GraphDefinition {
        &self.definition
    }

    /// Targets of the outgoing edges of `node_id` that apply to `state`, in edge order.
    pub fn next_nodes(&self, node_id: &str, state: &WorkflowState) -> Result<Vec<String>, WorkflowError> {
        let mut next = Vec::new();
        for edge in self.edges.iter().filter(|e| e.from_node == node_id) {
            let applies = match &edge.condition {
                Some(condition) => condition.evaluate(state)?,
                None => true,
            };
            if applies {
                next.push(edge.to_node.clone());
            }
        }
        Ok(next)
    }

    /// Drives `run` from the start node until no edge applies or a limit is hit.
    ///
    /// Runs one node at a time. When several edges apply, the first in definition order is
    /// taken and the rest are dropped. Traversal stops without error after
    /// `max_iterations` steps, or when a node is revisited once more than
    /// `loop_guard_iterations` steps have run. The run's status is left to the caller.
    pub async fn execute(&self, run: &SharedRun, ctx: RunContext<'_>) -> Result<(), WorkflowError> {
        let mut current = self.start_node.clone().ok_or(WorkflowError::NoStartNode)?;
        let run_id = run.read().await.run_id.clone();
        let mut visited = HashSet::new();
        let mut iterations = 0;

        loop {
            if iterations >= ctx.config.max_iterations {
                logging::log_iteration_ceiling(&run_id, ctx.config.max_iterations);
                break;
            }
            iterations += 1;

            if visited.contains(&current) && iterations > ctx.config.loop_guard_iterations {
                logging::log_loop_guard(&run_id, &current, iterations);
                break;
            }
            visited.insert(current.clone());
            run.write().await.current_node = Some(current.clone());

            self.execute_node(&current, run, &run_id, ctx).await?;

            let next = {
                let guard = run.read().await;
                self.next_nodes(&current, &guard.current_state)?
            };
            match next.as_slice() {
                [] => break,
                [only] => current = only.clone(),
                [first, ..] => {
                    logging::log_multiple_next_nodes(&run_id, &current, &next, first);
                    current = first.clone();
                }
            }
        }
        Ok(())
    }

    /// Executes one node: records it, calls its tool, folds the result into state.
    ///
    /// An object result is merged into the state; anything else is stored under
    /// `<node_id>_result`. A tool failure marks the record failed and is returned.
    async fn execute_node(
        &self,
        node_id: &str,
        run: &SharedRun,
        run_id: &str,
        ctx: RunContext<'_>,
    ) -> Result<(), WorkflowError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;

        let index = {
            let mut guard = run.write().await;
            guard.node_executions.push(NodeExecution::started(node_id));
            guard.node_executions.len() - 1
        };
        logging::log_node_start(run_id, node_id, &node.tool_name);
        ctx.events
            .emit(
                EventType::NodeStarted,
                event_data(json!({"run_id": run_id, "node_id": node_id, "tool": node.tool_name})),
            )
            .await;

        let params = resolve_params(&node.params, &run.read().await.current_state);

        match ctx.tools.execute(&node.tool_name, params).await {
            Ok(result) => {
                {
                    let mut guard = run.write().await;
                    match &result {
                        Value::Object(updates) => guard.current_state.merge(updates.clone()),
                        other => guard
                            .current_state
                            .set(format!("{}_result", node_id), other.clone()),
                    }
                    if let Some(execution) = guard.node_executions.get_mut(index) {
                        let mut output = StateMap::new();
                        output.insert("result".into(), result.clone());
                        execution.complete(output);
                        execution
                            .logs
                            .push(format!("tool '{}' completed", node.tool_name));
                    }
                }
                logging::log_node_complete(run_id, node_id);
                ctx.events
                    .emit(
                        EventType::NodeCompleted,
                        event_data(json!({"run_id": run_id, "node_id": node_id, "result": result})),
                    )
                    .await;
                Ok(())
            }
            Err(e) => {
                let err = WorkflowError::from_tool(&node.tool_name, e);
                {
                    let mut guard = run.write().await;
                    if let Some(execution) = guard.node_executions.get_mut(index) {
                        execution.fail(err.to_string());
                        execution.logs.push(format!("tool '{}' failed", node.tool_name));
                    }
                }
                logging::log_node_failed(run_id, node_id, &err);
                ctx.events
                    .emit(
                        EventType::NodeFailed,
                        event_data(json!({"run_id": run_id, "node_id": node_id, "error": err.to_string()})),
                    )
                    .await;
                Err(err)
            }
        }
    }
}
