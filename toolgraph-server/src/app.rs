//! Routes, shared state and request/response bodies.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use toolgraph::workflows::{
    llm_summarization_workflow, sample_llm_summarization_state, sample_summarization_state,
    summarization_workflow,
};
use toolgraph::{
    BroadcastListener, GraphDefinition, StateMap, ToolRegistry, WorkflowEngine, WorkflowError,
    WorkflowRun, WorkflowStore,
};

use crate::error::ServerError;
use crate::ws::ws_handler;

/// Shared by all routes.
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    pub store: Arc<dyn WorkflowStore>,
    /// Engine listener feeding WebSocket clients.
    pub events: BroadcastListener,
    demo_graph_id: OnceCell<String>,
    llm_demo_graph_id: OnceCell<String>,
}

impl AppState {
    /// Builds the engine over `tools` and `store` and wires the broadcast listener.
    pub fn new(tools: ToolRegistry, store: Arc<dyn WorkflowStore>) -> Arc<Self> {
        let engine = WorkflowEngine::new(Arc::new(tools)).with_store(Arc::clone(&store));
        let events = BroadcastListener::default();
        engine.add_event_listener(Arc::new(events.clone()));
        Arc::new(Self {
            engine: Arc::new(engine),
            store,
            events,
            demo_graph_id: OnceCell::new(),
            llm_demo_graph_id: OnceCell::new(),
        })
    }

    /// Id of the bundled summarization graph, registering it on first use.
    pub async fn demo_graph_id(&self) -> Result<String, WorkflowError> {
        self.demo_graph_id
            .get_or_try_init(|| self.engine.create_graph(summarization_workflow()))
            .await
            .cloned()
    }

    /// Id of the bundled LLM summarization graph, registering it on first use.
    pub async fn llm_demo_graph_id(&self) -> Result<String, WorkflowError> {
        self.llm_demo_graph_id
            .get_or_try_init(|| self.engine.create_graph(llm_summarization_workflow()))
            .await
            .cloned()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/graph/create", post(create_graph))
        .route("/graph/run", post(run_workflow))
        .route("/graph/state/:run_id", get(get_run_state))
        .route("/graph/:graph_id", get(get_graph).delete(delete_graph))
        .route("/graphs", get(list_graphs))
        .route("/runs", get(list_runs))
        .route("/run/:run_id", delete(delete_run))
        .route("/tools", get(list_tools))
        .route("/ws/:run_id", get(ws_handler));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/demo/summarization", post(demo_summarization))
        .route("/demo/llm-summarization", post(demo_llm_summarization))
        .nest("/api/v1", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                    info_span!("request", method = %req.method(), uri = %req.uri())
                }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateGraphRequest {
    pub definition: GraphDefinition,
}

#[derive(Debug, Serialize)]
pub struct CreateGraphResponse {
    pub graph_id: String,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RunWorkflowRequest {
    pub graph_id: String,
    #[serde(default)]
    pub initial_state: StateMap,
}

#[derive(Debug, Serialize)]
pub struct RunWorkflowResponse {
    pub run_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub graph_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    pub async_func: bool,
    pub available: bool,
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Workflow Engine API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "create_graph": "POST /api/v1/graph/create",
            "run_workflow": "POST /api/v1/graph/run",
            "get_state": "GET /api/v1/graph/state/{run_id}",
            "list_graphs": "GET /api/v1/graphs",
            "list_runs": "GET /api/v1/runs",
            "list_tools": "GET /api/v1/tools",
            "websocket": "WS /api/v1/ws/{run_id}",
            "demo": "POST /demo/summarization",
            "llm_demo": "POST /demo/llm-summarization"
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "workflow-engine" }))
}

async fn create_graph(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGraphRequest>,
) -> Result<Json<CreateGraphResponse>, ServerError> {
    let graph_id = state.engine.create_graph(req.definition).await?;
    info!(graph_id = %graph_id, "graph created");
    Ok(Json(CreateGraphResponse {
        graph_id,
        message: "Graph created successfully",
    }))
}

/// Starts the run in the background and answers at once; follow it over the WebSocket or
/// by polling `/graph/state/:run_id`.
async fn run_workflow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunWorkflowRequest>,
) -> Result<Json<RunWorkflowResponse>, ServerError> {
    let run_id = state.engine.spawn_workflow(&req.graph_id, req.initial_state)?;
    info!(run_id = %run_id, graph_id = %req.graph_id, "run started");
    Ok(Json(RunWorkflowResponse {
        run_id,
        status: "starting",
        message: "Workflow execution started",
    }))
}

async fn get_run_state(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let run = state
        .engine
        .find_run(&run_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Workflow run not found".into()))?;
    Ok(Json(run_status_body(run)))
}

fn run_status_body(run: WorkflowRun) -> Value {
    json!({
        "run_id": run.run_id,
        "graph_id": run.graph_id,
        "status": run.status,
        "current_node": run.current_node,
        "current_state": run.current_state.data,
        "node_executions": run.node_executions,
        "created_at": run.created_at,
        "completed_at": run.completed_at,
        "error": run.error,
    })
}

async fn get_graph(
    State(state): State<Arc<AppState>>,
    Path(graph_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let graph = state
        .engine
        .get_graph(&graph_id)
        .ok_or_else(|| ServerError::NotFound("Graph not found".into()))?;
    Ok(Json(json!({ "graph_id": graph_id, "definition": graph.definition() })))
}

async fn list_graphs(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ServerError> {
    let graphs = state.store.list_graphs().await?;
    Ok(Json(json!({ "graphs": graphs })))
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Value>, ServerError> {
    let runs = state.store.list_runs(query.graph_id.as_deref()).await?;
    Ok(Json(json!({ "runs": runs })))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tools: Vec<ToolEntry> = state
        .engine
        .tools()
        .get_tools()
        .into_iter()
        .map(|(name, info)| ToolEntry {
            name,
            description: info.description,
            async_func: info.is_async,
            available: info.available,
        })
        .collect();
    Json(json!({ "tools": tools }))
}

async fn delete_graph(
    State(state): State<Arc<AppState>>,
    Path(graph_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if !state.engine.delete_graph(&graph_id).await? {
        return Err(ServerError::NotFound("Graph not found".into()));
    }
    info!(graph_id = %graph_id, "graph deleted");
    Ok(Json(json!({ "message": "Graph deleted successfully" })))
}

async fn delete_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    if !state.engine.delete_run(&run_id).await? {
        return Err(ServerError::NotFound("Run not found".into()));
    }
    Ok(Json(json!({ "message": "Run deleted successfully" })))
}

/// Runs the bundled summarization pipeline on the sample text.
async fn demo_summarization(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ServerError> {
    let graph_id = state.demo_graph_id().await?;
    let sample = sample_summarization_state();
    let run_id = state.engine.spawn_workflow(&graph_id, sample.clone())?;
    Ok(Json(json!({
        "message": "Demo summarization workflow started",
        "graph_id": graph_id,
        "run_id": run_id,
        "sample_data": sample,
        "note": "Use GET /api/v1/graph/state/{run_id} to see execution results"
    })))
}

/// Runs the bundled LLM summarization pipeline on the sample text. Without a configured
/// model its tools use their rule-based fallbacks.
async fn demo_llm_summarization(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ServerError> {
    let graph_id = state.llm_demo_graph_id().await?;
    let sample = sample_llm_summarization_state();
    let run_id = state.engine.spawn_workflow(&graph_id, sample.clone())?;
    Ok(Json(json!({
        "message": "Demo LLM summarization workflow started",
        "graph_id": graph_id,
        "run_id": run_id,
        "sample_data": sample,
        "note": "Use GET /api/v1/graph/state/{run_id} to see execution results"
    })))
}
