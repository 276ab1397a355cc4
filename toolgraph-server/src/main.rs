//! HTTP and WebSocket server for toolgraph workflows.
//!
//! Routes live under `/api/v1` (see [`app::router`]). Configure via env, loaded from `.env`
//! with dotenv: `LISTEN`, `DB_PATH` (`:memory:` for a non-durable store), `LOG_FILE`,
//! `REGISTER_DEMO_WORKFLOWS`, `RUST_LOG`. The LLM tools read `OPENAI_API_KEY`, `OPENAI_BASE_URL`
//! and `OPENAI_MODEL`; without a key they use their rule-based fallbacks.

mod app;
mod config;
mod error;
mod ws;

use std::io::{self, Write};

use toolgraph::{llm_from_env, register_llm_tools, register_text_tools, ToolRegistry};
use tracing::{info, warn};

use crate::app::AppState;
use crate::config::ServerConfig;

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}

/// Writer that drops ANSI CSI sequences (e.g. `ESC [ 0 m`) so file logs are plain text.
struct StripAnsiWriter<W> {
    inner: W,
    /// Pending escape: ESC, or ESC [ plus parameter bytes awaiting the final byte.
    pending: Vec<u8>,
}

impl<W: Write> StripAnsiWriter<W> {
    const ESC: u8 = 0x1b;
    /// Longest parameter run kept before giving up and passing the bytes through.
    const MAX_PENDING: usize = 64;

    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }

    fn is_parameter(b: u8) -> bool {
        matches!(b, b'0'..=b'9' | b';' | b':' | b'?' | b'[')
    }

    fn is_final(b: u8) -> bool {
        (0x40..=0x7e).contains(&b)
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while let Some((&b, tail)) = rest.split_first() {
            match self.pending.len() {
                0 => match rest.iter().position(|&c| c == Self::ESC) {
                    Some(i) => {
                        self.inner.write_all(&rest[..i])?;
                        self.pending.push(Self::ESC);
                        rest = &rest[i + 1..];
                        continue;
                    }
                    None => {
                        self.inner.write_all(rest)?;
                        break;
                    }
                },
                1 => {
                    self.pending.push(b);
                    if b != b'[' {
                        self.flush_pending()?;
                    }
                }
                _ if Self::is_final(b) => self.pending.clear(),
                _ if Self::is_parameter(b) => {
                    self.pending.push(b);
                    if self.pending.len() > Self::MAX_PENDING {
                        self.flush_pending()?;
                    }
                }
                _ => {
                    self.flush_pending()?;
                    self.pending.push(b);
                }
            }
            rest = tail;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.flush_pending()?;
        }
        self.inner.flush()
    }
}

/// Initializes tracing: always to stdout; if env `LOG_FILE` is set, also to that file (append).
fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,toolgraph=debug,toolgraph_server=debug")
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stdout_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let plain_writer = std::sync::Mutex::new(StripAnsiWriter::new(file));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(plain_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_filter(filter);
        registry.with(file_layer).init();
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    init_tracing()?;

    let config = ServerConfig::from_env();
    info!(
        listen = %config.listen,
        db_path = %config.db_path,
        demo = config.register_demo_workflows,
        "server config loaded"
    );

    let store = config.open_store()?;
    let mut tools = ToolRegistry::new();
    register_text_tools(&mut tools);
    let llm = llm_from_env();
    info!(enabled = llm.is_some(), "LLM client configured");
    register_llm_tools(&mut tools, llm);
    let state = AppState::new(tools, store);

    let restored = state.engine.restore_graphs().await?;
    info!(graphs = restored, "graphs restored from store");

    if config.register_demo_workflows {
        match state.demo_graph_id().await {
            Ok(graph_id) => info!(graph_id = %graph_id, "registered summarization workflow"),
            Err(e) => warn!(error = %e, "failed to register summarization workflow"),
        }
        match state.llm_demo_graph_id().await {
            Ok(graph_id) => info!(graph_id = %graph_id, "registered LLM summarization workflow"),
            Err(e) => warn!(error = %e, "failed to register LLM summarization workflow"),
        }
    }

    let app = app::router(state);
    info!("listening on http://{}", config.listen);
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
