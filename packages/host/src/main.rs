//! The modweave host binary.
//!
//! Builds the resolved loader graph described by the config, installs
//! the system routing context, loads the entry artifact, and runs it.
//! An absent entry artifact exits with code 1; any other failure exits
//! with code 2.

mod config;
mod error;
mod graph;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modweave_loader::SystemContext;

use crate::config::HostConfig;
use crate::error::HostError;
use crate::graph::LoaderGraph;
use crate::runner::RunEntry;

/// modweave - run an entry artifact from a graph of artifact stores
#[derive(Parser, Debug)]
#[command(name = "modweave")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Loader graph configuration file (JSON)
    #[arg(long, conflicts_with = "store")]
    config: Option<PathBuf>,

    /// Shorthand for a single-loader graph over one store directory
    #[arg(long)]
    store: Option<PathBuf>,

    /// Entry artifact name, e.g. `app.Main`
    entry: String,

    /// Arguments passed to the entry artifact
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_not_found() => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<(), HostError> {
    let config = match (&args.config, &args.store) {
        (Some(path), _) => HostConfig::from_file(path)?,
        (None, Some(store)) => HostConfig::single_store(store.clone()),
        (None, None) => HostConfig::single_store(PathBuf::from(".")),
    };

    let graph = LoaderGraph::build(&config)?;
    SystemContext::install(Arc::clone(graph.context()));

    let artifact = graph.entry().load(&args.entry)?;
    artifact.run(&args.args)
}
