//! rangefetch - split HTTP downloads over byte-range requests
//!
//! Fetches a resource by splitting it into byte-range chunks, issuing one
//! `Range` request per chunk and reassembling the bodies into a single
//! ordered payload that looks as if it came from one ordinary GET.
//!
//! # Architecture
//!
//! ```text
//! RangeClient
//!     │
//!     ├── probe        HEAD → ResourceCapabilities
//!     ├── plan         content length → ChunkPlan
//!     ├── FetchStrategy (trait)
//!     │       ├── SequentialStrategy
//!     │       └── ParallelStrategy
//!     │             └── fetch_range   GET + Range → ChunkResponse (206)
//!     └── merge        sort by recovered start offset → MergedResource
//! ```
//!
//! All HTTP traffic goes through an injected [`HttpTransport`].

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod plan;
pub mod probe;
pub mod range;
pub mod sort;
pub mod strategy;
pub mod transport;
pub mod types;

pub use client::RangeClient;
pub use config::{ConfigError, ConfigFile, DownloadConfig};
pub use error::{DownloadError, DownloadResult, Stage};
pub use plan::ChunkPlan;
pub use range::{ByteRange, HttpRange, RangeError};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use types::{ChunkResponse, DownloadMode, MergedResource, ResourceCapabilities};
