//! Download configuration and the INI config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::transport::DEFAULT_TIMEOUT_SECS;

/// Default number of chunks a resource is split into.
pub const DEFAULT_CHUNKS: usize = 10;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("rangefetch/", env!("CARGO_PKG_VERSION"));

const DOWNLOAD_SECTION: &str = "download";

/// Configuration for a [`RangeClient`](crate::RangeClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Number of range requests to split a resource into.
    pub chunks: usize,

    /// Number of range requests in flight at once.
    ///
    /// 1 fetches chunks sequentially.
    pub parallel_downloads: usize,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunks: DEFAULT_CHUNKS,
            parallel_downloads: 1,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadConfig {
    /// Set the number of chunks (minimum 1).
    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks.max(1);
        self
    }

    /// Set the number of concurrent range requests (minimum 1).
    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.parallel_downloads = parallel.max(1);
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Errors reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("could not determine the user config directory")]
    NoConfigDir,
}

/// Returns the default config file path, `<config dir>/rangefetch/config.ini`.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("rangefetch").join("config.ini"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Settings persisted in the INI config file.
///
/// Every key is optional; unset keys fall back to [`DownloadConfig`] defaults.
///
/// ```ini
/// [download]
/// chunks = 10
/// parallel_downloads = 4
/// timeout_secs = 300
/// user_agent = rangefetch/0.1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub chunks: Option<usize>,
    pub parallel_downloads: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl ConfigFile {
    /// Loads the config file from the default location.
    ///
    /// A missing file yields an empty config.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads the config file at `path`. Unknown keys are ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let Some(section) = ini.section(Some(DOWNLOAD_SECTION)) else {
            return Ok(Self::default());
        };

        Ok(Self {
            chunks: parse_key(section.get("chunks"), "chunks")?,
            parallel_downloads: parse_key(
                section.get("parallel_downloads"),
                "parallel_downloads",
            )?,
            timeout_secs: parse_key(section.get("timeout_secs"), "timeout_secs")?,
            user_agent: section.get("user_agent").map(str::to_string),
        })
    }

    /// Writes the set keys to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        let mut section = ini.with_section(Some(DOWNLOAD_SECTION));
        if let Some(chunks) = self.chunks {
            section.set("chunks", chunks.to_string());
        }
        if let Some(parallel) = self.parallel_downloads {
            section.set("parallel_downloads", parallel.to_string());
        }
        if let Some(timeout) = self.timeout_secs {
            section.set("timeout_secs", timeout.to_string());
        }
        if let Some(ref agent) = self.user_agent {
            section.set("user_agent", agent.as_str());
        }

        ini.write_to_file(path).map_err(write_error)
    }

    /// Applies the set keys on top of `base`.
    pub fn apply(&self, base: DownloadConfig) -> DownloadConfig {
        let mut config = base;
        if let Some(chunks) = self.chunks {
            config = config.with_chunks(chunks);
        }
        if let Some(parallel) = self.parallel_downloads {
            config = config.with_parallel_downloads(parallel);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(ref agent) = self.user_agent {
            config = config.with_user_agent(agent.clone());
        }
        config
    }
}

fn parse_key<T: std::str::FromStr>(value: Option<&str>, key: &str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: format!("{}.{}", DOWNLOAD_SECTION, key),
                value: v.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_download_config_default() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunks, 10);
        assert_eq!(config.parallel_downloads, 1);
        assert_eq!(config.timeout.as_secs(), DEFAULT_TIMEOUT_SECS);
        assert!(config.user_agent.starts_with("rangefetch/"));
    }

    #[test]
    fn test_download_config_builders_enforce_minimums() {
        let config = DownloadConfig::default()
            .with_chunks(0)
            .with_parallel_downloads(0)
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent");

        assert_eq!(config.chunks, 1);
        assert_eq!(config.parallel_downloads, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_config_file_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let file = ConfigFile {
            chunks: Some(8),
            parallel_downloads: Some(4),
            timeout_secs: Some(60),
            user_agent: None,
        };
        file.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn test_config_file_ignores_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(
            &path,
            "[download]\nchunks = 3\nretries = 9\n\n[other]\nkey = value\n",
        )
        .unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.chunks, Some(3));
        assert_eq!(loaded.parallel_downloads, None);
    }

    #[test]
    fn test_config_file_invalid_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[download]\nchunks = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "download.chunks"));
    }

    #[test]
    fn test_config_file_missing_section() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[other]\nkey = value\n").unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_config_file_apply() {
        let file = ConfigFile {
            chunks: Some(16),
            timeout_secs: Some(30),
            ..Default::default()
        };
        let config = file.apply(DownloadConfig::default());

        assert_eq!(config.chunks, 16);
        assert_eq!(config.parallel_downloads, 1);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
