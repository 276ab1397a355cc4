//! Raw overrides for a run, as given on the command line or built programmatically.
//!
//! Turned into a [`RunConfig`](super::RunConfig) by
//! [`RunConfig::from_options`](super::RunConfig::from_options).

use std::path::PathBuf;

/// Unvalidated run inputs. All fields are optional; `demo` and `llm_demo` select a bundled
/// pipeline.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Graph definition JSON file.
    pub definition: Option<PathBuf>,
    /// Initial state: a JSON object literal or a path to a file holding one.
    pub state: Option<String>,
    /// Run the bundled summarization pipeline instead of a definition file.
    pub demo: bool,
    /// Run the bundled LLM summarization pipeline instead of a definition file.
    pub llm_demo: bool,
    /// SQLite file to persist the graph and run into.
    pub db_path: Option<String>,
    /// Print event payloads, not only event names.
    pub verbose: bool,
}
