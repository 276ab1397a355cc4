//! `toolgraph` binary: run a workflow definition (or the bundled demo) and print the result.

use std::path::PathBuf;

use clap::Parser;
use toolgraph_cli::{run_with_options, NodeStatus, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "toolgraph")]
#[command(about = "Run a workflow graph locally; events go to stderr, the final state to stdout")]
struct Args {
    /// Graph definition JSON file
    #[arg(short, long, value_name = "FILE")]
    definition: Option<PathBuf>,

    /// Initial state: JSON object literal or path to a JSON file
    #[arg(short, long, value_name = "JSON|FILE")]
    state: Option<String>,

    /// Run the bundled summarization pipeline on sample text
    #[arg(long)]
    demo: bool,

    /// Run the bundled LLM summarization pipeline on sample text (OPENAI_API_KEY enables the model)
    #[arg(long)]
    llm_demo: bool,

    /// SQLite file to persist the graph and run (default: DB_PATH, else in memory)
    #[arg(long, value_name = "PATH")]
    db: Option<String>,

    /// Print event payloads
    #[arg(short, long)]
    verbose: bool,
}

/// Engine logs go to stderr next to the event lines. `RUST_LOG` overrides the default level
/// (`warn`, or `info` with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let options = RunOptions {
        definition: args.definition,
        state: args.state,
        demo: args.demo,
        llm_demo: args.llm_demo,
        db_path: args.db,
        verbose: args.verbose,
    };

    let run = match run_with_options(&options).await {
        Ok(run) => run,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    println!("run {} {}", run.run_id, run.status);
    for exec in &run.node_executions {
        match &exec.error {
            Some(err) => println!("  {} {} ({})", exec.node_id, exec.status, err),
            None => println!("  {} {}", exec.node_id, exec.status),
        }
    }
    println!("{}", serde_json::to_string_pretty(&run.current_state.data)?);

    if run.status == NodeStatus::Failed {
        if let Some(err) = &run.error {
            eprintln!("error: {}", err);
        }
        std::process::exit(1);
    }
    Ok(())
}
