//! forcegraph command-line tool.
//!
//! Provides the `forcegraph` binary with two subcommands:
//! - `layout` reads an edge list, runs the force-directed layout to
//!   convergence and prints the resulting snapshot as JSON.
//! - `edit` loads an edge list into an in-memory remote store and runs one
//!   full select/submit/resolve cycle through the edit controller.
//!
//! Both accept `--config <file.json>` holding a `SessionConfig`; flags and
//! the `FORCEGRAPH_SEED` / `FORCEGRAPH_MAX_ITERATIONS` environment variables
//! override it.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use forcegraph_core::{parse_edge_list, EdgeId, Graph, GraphPayload, Normalize};
use forcegraph_layout::{LayoutEngine, Placement};
use forcegraph_session::{EditController, MemoryRemoteStore, SessionConfig, StorePolicy};

/// Force-directed graph layout and edge weight editing.
#[derive(Parser)]
#[command(name = "forcegraph", about = "Force-directed graph layout and edge editing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Lay out a graph and print the positioned snapshot.
    Layout {
        #[command(flatten)]
        source: Source,

        /// Seed for random initial placement (default: circle placement).
        #[arg(long, env = "FORCEGRAPH_SEED")]
        seed: Option<u64>,

        /// Iteration cap for the layout run.
        #[arg(long, env = "FORCEGRAPH_MAX_ITERATIONS")]
        max_iterations: Option<usize>,
    },

    /// Change one edge weight through the optimistic edit session.
    Edit {
        #[command(flatten)]
        source: Source,

        /// Edge to edit, e.g. "0-1".
        #[arg(short, long)]
        edge: String,

        /// New weight.
        #[arg(short, long)]
        weight: f64,

        /// Store rejects weights above this.
        #[arg(long)]
        max_weight: Option<f64>,

        /// Store rounds accepted weights to this many decimal places.
        #[arg(long)]
        precision: Option<u32>,

        /// Simulated store latency in milliseconds.
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,

        /// Persistence timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

/// Input options shared by every subcommand.
#[derive(clap::Args)]
struct Source {
    /// Edge-list file: one "source target weight" per line.
    #[arg(short, long)]
    input: PathBuf,

    /// Divide all weights by the largest one.
    #[arg(long)]
    normalize: bool,

    /// JSON file with a SessionConfig.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Layout {
            source,
            seed,
            max_iterations,
        } => run_layout(&source, seed, max_iterations),
        Commands::Edit {
            source,
            edge,
            weight,
            max_weight,
            precision,
            latency_ms,
            timeout_ms,
        } => {
            let policy = StorePolicy {
                max_weight,
                precision,
                latency_ms,
            };
            run_edit(&source, EdgeId::new(edge), weight, policy, timeout_ms).await
        }
    };
    process::exit(exit_code);
}

/// Execute the layout subcommand.
///
/// Returns exit code: 0 = success, 2 = input or configuration error.
fn run_layout(source: &Source, seed: Option<u64>, max_iterations: Option<usize>) -> i32 {
    let (payload, mut config) = match read_inputs(source) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 2;
        }
    };
    if let Some(seed) = seed {
        config.layout.placement = Placement::Random { seed };
    }
    if let Some(max_iterations) = max_iterations {
        config.layout.max_iterations = max_iterations;
    }

    let engine = match LayoutEngine::new(config.layout) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };
    let mut graph = match Graph::load(payload) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };

    match engine.run(&mut graph) {
        Ok(report) => {
            info!(
                iterations = report.iterations,
                converged = report.converged,
                components = graph.component_count(),
                "layout finished"
            );
            print_json(&graph.snapshot());
            0
        }
        Err(e) => {
            eprintln!("Layout error: {}", e);
            2
        }
    }
}

/// Execute the edit subcommand.
///
/// Returns exit code: 0 = committed, 1 = rolled back, 2 = input error.
async fn run_edit(
    source: &Source,
    edge: EdgeId,
    weight: f64,
    policy: StorePolicy,
    timeout_ms: Option<u64>,
) -> i32 {
    let (payload, mut config) = match read_inputs(source) {
        Ok(inputs) => inputs,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 2;
        }
    };
    if let Some(timeout_ms) = timeout_ms {
        config.persist_timeout_ms = timeout_ms;
    }

    let store = Arc::new(MemoryRemoteStore::with_policy(payload, policy));
    let mut controller = match EditController::new(store, config) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };
    if let Err(e) = controller.load().await {
        eprintln!("Error: {}", e);
        return 2;
    }

    let started = controller
        .select(&edge)
        .and_then(|_| controller.submit(weight));
    if let Err(e) = started {
        eprintln!("Error: {}", e);
        return 2;
    }

    let outcome = controller.next_outcome().await;
    if let Err(e) = settle_layout(&mut controller) {
        eprintln!("Layout error: {}", e);
        return 2;
    }

    let snapshot = controller.snapshot();
    match outcome {
        Ok(committed) => {
            print_json(&serde_json::json!({
                "outcome": "committed",
                "edge": committed,
                "snapshot": *snapshot,
            }));
            0
        }
        Err(e) => {
            eprintln!("Edit rolled back: {}", e);
            print_json(&serde_json::json!({
                "outcome": "rolled_back",
                "error": e.to_string(),
                "snapshot": *snapshot,
            }));
            1
        }
    }
}

/// Ticks the controller's layout until it stops moving.
fn settle_layout(controller: &mut EditController) -> Result<(), forcegraph_session::SessionError> {
    while controller.tick()?.is_some() {}
    Ok(())
}

fn read_inputs(source: &Source) -> Result<(GraphPayload, SessionConfig), String> {
    let normalize = if source.normalize {
        Normalize::ByMax
    } else {
        Normalize::None
    };
    let text = std::fs::read_to_string(&source.input)
        .map_err(|e| format!("failed to read '{}': {}", source.input.display(), e))?;
    let payload = parse_edge_list(&text, normalize)
        .map_err(|e| format!("{}: {}", source.input.display(), e))?;
    let config = match &source.config {
        Some(path) => read_config(path)?,
        None => SessionConfig::default(),
    };
    Ok((payload, config))
}

fn read_config(path: &Path) -> Result<SessionConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read config '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config '{}': {}", path.display(), e))
}

/// Prints a JSON value to stdout for machine-readable output.
fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}
