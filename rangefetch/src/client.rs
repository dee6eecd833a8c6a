//! High-level split download client.
//!
//! Coordinates the probe → plan → fetch → merge pipeline and decides up
//! front, from the capability probe, whether to split at all. Once splitting
//! has started there is no fallback: any failure aborts the download.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::StatusCode;
use tracing::info;

use crate::config::DownloadConfig;
use crate::error::{DownloadError, DownloadResult};
use crate::merge::merge;
use crate::plan::plan;
use crate::probe::probe;
use crate::strategy::{FetchStrategy, ParallelStrategy, SequentialStrategy};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport, TransportError};
use crate::types::{DownloadMode, MergedResource};

/// Split download client.
///
/// # Example
///
/// ```ignore
/// use rangefetch::{DownloadConfig, RangeClient};
///
/// let client = RangeClient::new(DownloadConfig::default().with_parallel_downloads(4))?;
/// let resource = client.get_with_byte_range("https://example.com/video.mp4", 8)?;
/// println!("{} bytes via {}", resource.content_length(), resource.mode());
/// ```
pub struct RangeClient {
    transport: Arc<dyn HttpTransport>,
    config: DownloadConfig,
}

impl RangeClient {
    /// Create a client backed by a reqwest transport built from `config`.
    pub fn new(config: DownloadConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::with_settings(config.timeout, &config.user_agent)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create a client with an explicit transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: DownloadConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `url` split into the configured number of chunks.
    pub fn download(&self, url: &str) -> DownloadResult<MergedResource> {
        self.get_with_byte_range(url, self.config.chunks)
    }

    /// Download `url`, splitting it into `chunks` range requests when the
    /// server supports byte ranges and reports a non-zero length.
    ///
    /// Otherwise the resource is fetched with one plain GET.
    pub fn get_with_byte_range(&self, url: &str, chunks: usize) -> DownloadResult<MergedResource> {
        let capabilities = probe(self.transport.as_ref(), url)?;

        if !capabilities.is_splittable() {
            info!(
                url,
                content_length = capabilities.content_length,
                supports_byte_ranges = capabilities.supports_byte_ranges,
                "Range split not applicable, fetching whole resource"
            );
            return self.get_whole(url);
        }

        let plan = plan(capabilities.content_length, chunks)?;
        let strategy = self.strategy();
        info!(
            url,
            content_length = capabilities.content_length,
            chunks = plan.len(),
            strategy = strategy.name(),
            "Starting split download"
        );

        let responses = strategy.execute(self.transport.as_ref(), url, &plan)?;
        let merged = merge(responses, capabilities.content_length)?;

        if merged.content_length() != capabilities.content_length {
            return Err(DownloadError::LengthMismatch {
                expected: capabilities.content_length,
                actual: merged.content_length(),
            });
        }

        Ok(merged)
    }

    /// Download `url` with a single GET, bypassing planning and merging.
    pub fn get_whole(&self, url: &str) -> DownloadResult<MergedResource> {
        let response = self
            .transport
            .execute(HttpRequest::get(url))
            .map_err(|source| DownloadError::Get {
                url: url.to_string(),
                source,
            })?;

        if !response.status.is_success() {
            return Err(DownloadError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let mut body = response.body;
        let mut buffer = Vec::new();
        body.read_to_end(&mut buffer)
            .map_err(|source| DownloadError::BodyRead {
                range: "whole resource".to_string(),
                source,
            })?;
        drop(body);

        Ok(MergedResource {
            status: StatusCode::OK,
            headers: response.headers,
            request: response.request,
            body: Bytes::from(buffer),
            mode: DownloadMode::Whole,
        })
    }

    /// Choose the fetch strategy from the configured parallelism.
    fn strategy(&self) -> Box<dyn FetchStrategy> {
        if self.config.parallel_downloads <= 1 {
            Box::new(SequentialStrategy::new())
        } else {
            Box::new(ParallelStrategy::new(self.config.parallel_downloads))
        }
    }
}
