//! Validated run config: which graph, which initial state, where to persist.
//!
//! Interacts with [`RunOptions`](super::RunOptions) and [`run_with_config`](crate::run_with_config).

use std::path::{Path, PathBuf};

use toolgraph::workflows::{
    llm_summarization_workflow, sample_llm_summarization_state, sample_summarization_state,
    summarization_workflow,
};
use toolgraph::{GraphDefinition, LlmConfig, StateMap};

use super::RunOptions;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Where the graph definition comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum DefinitionSource {
    /// JSON file holding a graph definition.
    File(PathBuf),
    /// Bundled summarization pipeline.
    Demo,
    /// Bundled LLM summarization pipeline.
    LlmDemo,
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub definition: DefinitionSource,
    pub initial_state: StateMap,
    /// SQLite database path. `None` keeps everything in memory.
    pub db_path: Option<String>,
    /// When true, events are printed with their payloads.
    pub verbose: bool,
    /// Model for the LLM tools. Without an API key they use their rule-based fallbacks.
    pub llm: LlmConfig,
}

impl RunConfig {
    /// Validates `options`.
    ///
    /// Exactly one of `definition`, `demo` and `llm_demo` must be given. With a demo, its
    /// sample state is the base and `state` keys override it. No LLM is configured here;
    /// [`run_with_options`](crate::run_with_options) fills [`llm`](Self::llm) from the environment.
    pub fn from_options(options: &RunOptions) -> Result<Self, Error> {
        let definition = match (&options.definition, options.demo, options.llm_demo) {
            (Some(path), false, false) => DefinitionSource::File(path.clone()),
            (None, true, false) => DefinitionSource::Demo,
            (None, false, true) => DefinitionSource::LlmDemo,
            (None, false, false) => {
                return Err("no graph given: pass --definition <FILE>, --demo or --llm-demo".into())
            }
            _ => return Err("use only one of --definition, --demo and --llm-demo".into()),
        };

        let mut initial_state = match definition {
            DefinitionSource::Demo => sample_summarization_state(),
            DefinitionSource::LlmDemo => sample_llm_summarization_state(),
            DefinitionSource::File(_) => StateMap::new(),
        };
        if let Some(arg) = &options.state {
            initial_state.extend(parse_state(arg)?);
        }

        Ok(Self {
            definition,
            initial_state,
            db_path: options.db_path.clone().filter(|p| !p.is_empty()),
            verbose: options.verbose,
            llm: LlmConfig::default(),
        })
    }

    pub fn load_definition(&self) -> Result<GraphDefinition, Error> {
        match &self.definition {
            DefinitionSource::Demo => Ok(summarization_workflow()),
            DefinitionSource::LlmDemo => Ok(llm_summarization_workflow()),
            DefinitionSource::File(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
                Ok(GraphDefinition::from_json_str(&text)?)
            }
        }
    }
}

/// Parses `arg` as a JSON object; if it does not look like one, reads it as a file path.
pub fn parse_state(arg: &str) -> Result<StateMap, Error> {
    let trimmed = arg.trim();
    let text = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let path = Path::new(trimmed);
        std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read state file {}: {}", path.display(), e))?
    };
    match serde_json::from_str::<serde_json::Value>(&text)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(format!("initial state must be a JSON object, got {}", other).into()),
    }
}
