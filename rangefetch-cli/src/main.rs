//! rangefetch CLI - download a resource with parallel byte-range requests.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::download::{self, DownloadArgs};

/// Download a resource over HTTP by splitting it into byte-range chunks.
#[derive(Debug, Parser)]
#[command(name = "rangefetch", version, about)]
struct Cli {
    /// URL of the resource to download
    url: String,

    /// Number of range requests to split the resource into
    #[arg(short, long)]
    chunks: Option<usize>,

    /// Number of range requests in flight at once (1 = sequential)
    #[arg(short, long)]
    parallel: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write the downloaded payload to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip range splitting and fetch the resource with a single GET
    #[arg(long)]
    no_split: bool,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let args = DownloadArgs {
        url: cli.url,
        chunks: cli.chunks,
        parallel: cli.parallel,
        timeout: cli.timeout,
        output: cli.output,
        no_split: cli.no_split,
        config: cli.config,
    };

    match download::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
