//! Run entry points: [`run_with_options`] (reads `.env`) and [`run_with_config`].

pub use crate::config::Error;

mod run_with_config;

use toolgraph::WorkflowRun;

use toolgraph::LlmConfig;

use crate::config::{RunConfig, RunOptions};

pub use run_with_config::run_with_config;

/// Loads `.env`, validates `options` and runs the graph to completion.
///
/// `DB_PATH` from the environment is used when `options.db_path` is not set; the LLM tools
/// are configured from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
pub async fn run_with_options(options: &RunOptions) -> Result<WorkflowRun, Error> {
    dotenv::dotenv().ok();
    let mut options = options.clone();
    if options.db_path.is_none() {
        options.db_path = std::env::var("DB_PATH").ok();
    }
    let mut config = RunConfig::from_options(&options)?;
    config.llm = LlmConfig::from_env();
    run_with_config(&config).await
}
