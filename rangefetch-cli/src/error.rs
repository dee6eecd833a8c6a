//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use rangefetch::{ConfigError, DownloadError, TransportError};

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config(String),

    /// The HTTP client could not be created.
    Client(TransportError),

    /// The download failed.
    Download(DownloadError),

    /// Writing the output file failed.
    Output { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Download(e) => write!(f, "Download failed during {}: {}", e.stage(), e),
            CliError::Output { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Client(e) => Some(e),
            CliError::Download(e) => Some(e),
            CliError::Output { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Client(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Download(e)
    }
}
