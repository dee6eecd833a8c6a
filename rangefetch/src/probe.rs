//! Capability probe.
//!
//! A HEAD request tells us how large the resource is and whether the server
//! honors byte ranges, which decides between a split and a whole download.

use reqwest::header::ACCEPT_RANGES;
use tracing::{debug, warn};

use crate::error::{DownloadError, DownloadResult};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ResourceCapabilities;

/// The only `Accept-Ranges` value that enables splitting.
const BYTES_UNIT: &str = "bytes";

/// Probes `url` with a HEAD request.
///
/// Range support requires `Accept-Ranges` to be exactly `bytes`
/// (case-sensitive, single token). A missing or unparsable `Content-Length`
/// is reported as 0. A non-success HEAD status is reported as
/// "not splittable" so the caller falls back to a plain GET.
pub fn probe(transport: &dyn HttpTransport, url: &str) -> DownloadResult<ResourceCapabilities> {
    let response =
        transport
            .execute(HttpRequest::head(url))
            .map_err(|source| DownloadError::Probe {
                url: url.to_string(),
                source,
            })?;

    if !response.status.is_success() {
        warn!(url, status = %response.status, "HEAD request not successful, disabling range split");
        return Ok(ResourceCapabilities::default());
    }

    let capabilities = ResourceCapabilities {
        content_length: response.content_length().unwrap_or(0),
        supports_byte_ranges: response.header(&ACCEPT_RANGES) == Some(BYTES_UNIT),
    };

    debug!(
        url,
        content_length = capabilities.content_length,
        supports_byte_ranges = capabilities.supports_byte_ranges,
        "Probed resource"
    );

    Ok(capabilities)
}
