//! toolgraph-cli library: load a graph definition, run it locally, return the finished run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use toolgraph_cli::{run_with_options, RunOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), toolgraph_cli::Error> {
//! let options = RunOptions { demo: true, ..Default::default() };
//! let run = run_with_options(&options).await?;
//! println!("{} {}", run.status, run.current_state.data["final_summary"]);
//! # Ok(())
//! # }
//! ```

mod config;
mod event_printer;
mod run;

pub use config::{parse_state, DefinitionSource, Error, RunConfig, RunOptions};
pub use event_printer::{format_event, EventPrinter};
pub use run::{run_with_config, run_with_options};
pub use toolgraph::{NodeStatus, WorkflowRun};

#[cfg(test)]
mod tests;
