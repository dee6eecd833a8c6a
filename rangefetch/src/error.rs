//! Error types for split downloads.
//!
//! Every failure aborts the whole download. There is no partial result and no
//! mid-flight fallback to a whole-resource request, so a caller only ever sees
//! the first error encountered. [`DownloadError::stage`] tells which step of
//! the probe → plan → fetch → merge pipeline produced it.

use std::fmt;
use std::io;

use reqwest::StatusCode;
use thiserror::Error;

use crate::range::{ByteRange, RangeError};
use crate::transport::TransportError;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Pipeline step an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Probe,
    Plan,
    Fetch,
    Merge,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Probe => "probe",
            Stage::Plan => "plan",
            Stage::Fetch => "fetch",
            Stage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while downloading a resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HEAD request failed at the transport level.
    #[error("capability probe of {url} failed: {source}")]
    Probe {
        url: String,
        #[source]
        source: TransportError,
    },

    /// A chunk request did not come back as 206 Partial Content.
    #[error("range {range} of {url} not honored: server answered {status}")]
    RangeUnsupported {
        url: String,
        range: ByteRange,
        status: StatusCode,
    },

    /// A chunk request failed at the transport level.
    #[error("requesting range {range} of {url} failed: {source}")]
    Fetch {
        url: String,
        range: ByteRange,
        #[source]
        source: TransportError,
    },

    /// Draining a response body failed.
    #[error("reading body of {range} failed: {source}")]
    BodyRead {
        range: String,
        #[source]
        source: io::Error,
    },

    /// A merge was attempted with no chunk responses.
    #[error("no content received: nothing to merge")]
    NoContent,

    /// A range expression could not be parsed.
    #[error(transparent)]
    MalformedRange(#[from] RangeError),

    /// The requested plan would produce empty chunks.
    #[error("cannot plan {chunks} chunks over {content_length} bytes")]
    InvalidPlan { content_length: u64, chunks: usize },

    /// A whole-resource GET failed at the transport level.
    #[error("GET {url} failed: {source}")]
    Get {
        url: String,
        #[source]
        source: TransportError,
    },

    /// A whole-resource GET returned a non-success status.
    #[error("GET {url} failed with status {status}")]
    UnexpectedStatus { url: String, status: StatusCode },

    /// The merged payload does not match the probed content length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },
}

impl DownloadError {
    /// The pipeline step this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Probe { .. } => Stage::Probe,
            Self::InvalidPlan { .. } => Stage::Plan,
            Self::RangeUnsupported { .. }
            | Self::Fetch { .. }
            | Self::Get { .. }
            | Self::UnexpectedStatus { .. } => Stage::Fetch,
            Self::BodyRead { .. }
            | Self::NoContent
            | Self::MalformedRange(_)
            | Self::LengthMismatch { .. } => Stage::Merge,
        }
    }
}
