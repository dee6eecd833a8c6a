//! Download command - fetch a URL and report the result.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rangefetch::{ConfigFile, DownloadConfig, RangeClient};
use tracing::warn;

use crate::error::CliError;

/// Arguments for the download command.
pub struct DownloadArgs {
    pub url: String,
    pub chunks: Option<usize>,
    pub parallel: Option<usize>,
    pub timeout: Option<u64>,
    pub output: Option<PathBuf>,
    pub no_split: bool,
    pub config: Option<PathBuf>,
}

/// Resolve settings: CLI takes precedence, then config, then defaults.
pub fn resolve_config(args: &DownloadArgs, file: &ConfigFile) -> DownloadConfig {
    let mut config = file.apply(DownloadConfig::default());
    if let Some(chunks) = args.chunks {
        config = config.with_chunks(chunks);
    }
    if let Some(parallel) = args.parallel {
        config = config.with_parallel_downloads(parallel);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn load_config_file(path: Option<&PathBuf>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => Ok(ConfigFile::load().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable config file");
            ConfigFile::default()
        })),
    }
}

/// Run the download command.
pub fn run(args: DownloadArgs) -> Result<(), CliError> {
    let file = load_config_file(args.config.as_ref())?;
    let config = resolve_config(&args, &file);
    let client = RangeClient::new(config)?;

    let started = Instant::now();
    let resource = if args.no_split {
        client.get_whole(&args.url)?
    } else {
        client.download(&args.url)?
    };
    let elapsed = started.elapsed();

    println!("Status:  {}", resource.status());
    println!("Size:    {}", format_size(resource.content_length()));
    println!("Mode:    {}", resource.mode());
    println!("Elapsed: {:.2?}", elapsed);

    if let Some(path) = args.output {
        std::fs::write(&path, resource.body()).map_err(|source| CliError::Output {
            path: path.clone(),
            source,
        })?;
        println!("Saved:   {}", path.display());
    }

    Ok(())
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
