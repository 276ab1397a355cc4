use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::graph::GraphDefinition;
use crate::state::{NodeExecution, NodeStatus, WorkflowRun, WorkflowState};

use super::{GraphSummary, RunSummary, StoreError, WorkflowStore};

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

const SCHEMA: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;
    PRAGMA foreign_keys=ON;

    CREATE TABLE IF NOT EXISTS graphs (
        graph_id TEXT PRIMARY KEY,
        definition TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workflow_runs (
        run_id TEXT PRIMARY KEY,
        graph_id TEXT NOT NULL,
        status TEXT NOT NULL,
        initial_state TEXT NOT NULL,
        current_state TEXT NOT NULL,
        created_at TEXT NOT NULL,
        completed_at TEXT,
        current_node TEXT,
        error TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_runs_graph ON workflow_runs(graph_id, created_at DESC);

    CREATE TABLE IF NOT EXISTS node_executions (
        run_id TEXT NOT NULL REFERENCES workflow_runs(run_id) ON DELETE CASCADE,
        seq INTEGER NOT NULL,
        node_id TEXT NOT NULL,
        status TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT,
        error TEXT,
        output TEXT,
        logs TEXT NOT NULL DEFAULT '[]',
        PRIMARY KEY (run_id, seq)
    );";

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp '{}': {}", s, e)))
}

fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    s.as_deref().map(parse_ts).transpose()
}

fn parse_status(s: &str) -> Result<NodeStatus, StoreError> {
    s.parse().map_err(StoreError::Serialization)
}

/// Raw `workflow_runs` row, converted outside the rusqlite row closure.
struct RunRow {
    run_id: String,
    graph_id: String,
    status: String,
    initial_state: String,
    current_state: String,
    created_at: String,
    completed_at: Option<String>,
    current_node: Option<String>,
    error: Option<String>,
}

struct ExecutionRow {
    node_id: String,
    status: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    error: Option<String>,
    output: Option<String>,
    logs: String,
}

impl ExecutionRow {
    fn into_execution(self) -> Result<NodeExecution, StoreError> {
        Ok(NodeExecution {
            node_id: self.node_id,
            status: parse_status(&self.status)?,
            started_at: parse_opt_ts(self.started_at)?,
            completed_at: parse_opt_ts(self.completed_at)?,
            error: self.error,
            output: self.output.as_deref().map(serde_json::from_str).transpose()?,
            logs: serde_json::from_str(&self.logs)?,
        })
    }
}

/// SQLite-backed store: tables `graphs`, `workflow_runs` and `node_executions`.
///
/// Calls are short and synchronous under a mutex; node executions keep their order
/// through a per-run sequence number.
pub struct SqliteWorkflowStore {
    conn: Mutex<Connection>,
}

impl SqliteWorkflowStore {
    /// Opens or creates the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Storage(format!("failed to create {}: {}", parent.display(), e)))?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("connection lock poisoned: {}", e)))
    }

    fn load_executions(conn: &Connection, run_id: &str) -> Result<Vec<NodeExecution>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT node_id, status, started_at, completed_at, error, output, logs
             FROM node_executions WHERE run_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(ExecutionRow {
                    node_id: row.get(0)?,
                    status: row.get(1)?,
                    started_at: row.get(2)?,
                    completed_at: row.get(3)?,
                    error: row.get(4)?,
                    output: row.get(5)?,
                    logs: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ExecutionRow::into_execution).collect()
    }
}

#[async_trait]
impl WorkflowStore for SqliteWorkflowStore {
    async fn save_graph(&self, graph_id: &str, definition: &GraphDefinition) -> Result<(), StoreError> {
        let json = serde_json::to_string(definition)?;
        self.conn()?.execute(
            "INSERT INTO graphs (graph_id, definition, description, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(graph_id) DO UPDATE SET definition = excluded.definition,
                                                 description = excluded.description",
            params![graph_id, json, definition.description, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn load_graph(&self, graph_id: &str) -> Result<Option<GraphDefinition>, StoreError> {
        let json: Option<String> = self
            .conn()?
            .query_row(
                "SELECT definition FROM graphs WHERE graph_id = ?1",
                params![graph_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.as_deref().map(serde_json::from_str).transpose()?)
    }

    async fn list_graphs(&self) -> Result<Vec<GraphSummary>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT graph_id, description, created_at FROM graphs ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(graph_id, description, created_at)| {
                Ok(GraphSummary {
                    graph_id,
                    description,
                    created_at: parse_ts(&created_at)?,
                })
            })
            .collect()
    }

    async fn save_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        let initial = serde_json::to_string(&run.initial_state)?;
        let current = serde_json::to_string(&run.current_state)?;
        let executions = run
            .node_executions
            .iter()
            .map(|e| -> Result<_, serde_json::Error> {
                Ok((
                    e.output.as_ref().map(serde_json::to_string).transpose()?,
                    serde_json::to_string(&e.logs)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO workflow_runs
             (run_id, graph_id, status, initial_state, current_state, created_at, completed_at, current_node, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.run_id,
                run.graph_id,
                run.status.as_str(),
                initial,
                current,
                run.created_at.to_rfc3339(),
                run.completed_at.map(|t| t.to_rfc3339()),
                run.current_node,
                run.error,
            ],
        )?;
        tx.execute("DELETE FROM node_executions WHERE run_id = ?1", params![run.run_id])?;
        for (seq, (execution, (output, logs))) in run.node_executions.iter().zip(executions).enumerate() {
            tx.execute(
                "INSERT INTO node_executions
                 (run_id, seq, node_id, status, started_at, completed_at, error, output, logs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    run.run_id,
                    seq as i64,
                    execution.node_id,
                    execution.status.as_str(),
                    execution.started_at.map(|t| t.to_rfc3339()),
                    execution.completed_at.map(|t| t.to_rfc3339()),
                    execution.error,
                    output,
                    logs,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn load_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT run_id, graph_id, status, initial_state, current_state, created_at,
                        completed_at, current_node, error
                 FROM workflow_runs WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRow {
                        run_id: row.get(0)?,
                        graph_id: row.get(1)?,
                        status: row.get(2)?,
                        initial_state: row.get(3)?,
                        current_state: row.get(4)?,
                        created_at: row.get(5)?,
                        completed_at: row.get(6)?,
                        current_node: row.get(7)?,
                        error: row.get(8)?,
                    })
                },
            )
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let node_executions = Self::load_executions(&conn, run_id)?;
        Ok(Some(WorkflowRun {
            run_id: row.run_id,
            graph_id: row.graph_id,
            status: parse_status(&row.status)?,
            initial_state: serde_json::from_str::<WorkflowState>(&row.initial_state)?,
            current_state: serde_json::from_str::<WorkflowState>(&row.current_state)?,
            node_executions,
            created_at: parse_ts(&row.created_at)?,
            completed_at: parse_opt_ts(row.completed_at)?,
            current_node: row.current_node,
            error: row.error,
        }))
    }

    async fn list_runs(&self, graph_id: Option<&str>) -> Result<Vec<RunSummary>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, graph_id, status, created_at, completed_at FROM workflow_runs
             WHERE ?1 IS NULL OR graph_id = ?1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![graph_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(run_id, graph_id, status, created_at, completed_at)| {
                Ok(RunSummary {
                    run_id,
                    graph_id,
                    status: parse_status(&status)?,
                    created_at: parse_ts(&created_at)?,
                    completed_at: parse_opt_ts(completed_at)?,
                })
            })
            .collect()
    }

    async fn delete_graph(&self, graph_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM node_executions
             WHERE run_id IN (SELECT run_id FROM workflow_runs WHERE graph_id = ?1)",
            params![graph_id],
        )?;
        tx.execute("DELETE FROM workflow_runs WHERE graph_id = ?1", params![graph_id])?;
        let deleted = tx.execute("DELETE FROM graphs WHERE graph_id = ?1", params![graph_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    async fn delete_run(&self, run_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM node_executions WHERE run_id = ?1", params![run_id])?;
        let deleted = tx.execute("DELETE FROM workflow_runs WHERE run_id = ?1", params![run_id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}
