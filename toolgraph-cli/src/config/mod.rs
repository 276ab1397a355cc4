//! Configuration for a local workflow run.
//!
//! Re-exports [`RunConfig`], [`RunOptions`], [`DefinitionSource`] and config [`Error`].

mod run_config;
mod run_options;

pub use run_config::{parse_state, DefinitionSource, Error, RunConfig};
pub use run_options::RunOptions;
