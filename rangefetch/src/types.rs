//! Core data types shared by the download pipeline.

use std::fmt;

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use reqwest::header::{HeaderMap, RANGE};
use reqwest::StatusCode;

use crate::range::{parse_range, RangeError};
use crate::transport::{HttpRequest, HttpResponse};

/// What the capability probe learned about a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCapabilities {
    /// Declared size in bytes; 0 when unknown.
    pub content_length: u64,
    /// True when the server answered `Accept-Ranges: bytes`.
    pub supports_byte_ranges: bool,
}

impl ResourceCapabilities {
    /// Returns true if splitting into range requests makes sense.
    pub fn is_splittable(&self) -> bool {
        self.supports_byte_ranges && self.content_length > 0
    }
}

/// The raw 206 response for one planned chunk.
///
/// The body is still unread; the merge step drains and releases it.
#[derive(Debug)]
pub struct ChunkResponse {
    response: HttpResponse,
}

impl ChunkResponse {
    pub(crate) fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    /// The request this chunk was fetched with.
    pub fn request(&self) -> &HttpRequest {
        &self.response.request
    }

    /// Recovers the start offset from the originating request's `Range` header.
    pub fn requested_start(&self, size: u64) -> Result<u64, RangeError> {
        let value = self
            .request()
            .header(&RANGE)
            .ok_or_else(|| RangeError::Malformed {
                input: String::new(),
                reason: "request carries no Range header",
            })?;
        let ranges = parse_range(value, size)?;
        // parse_range never returns an empty list on success
        Ok(ranges.first().map_or(0, |r| r.start))
    }

    /// The `Range` header value of the originating request, for diagnostics.
    pub fn range_label(&self) -> String {
        self.request()
            .header(&RANGE)
            .unwrap_or("<no range>")
            .to_string()
    }

    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}

/// How a [`MergedResource`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// Assembled from this many range requests.
    Split { chunks: usize },
    /// Fetched with a single whole-resource GET.
    Whole,
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadMode::Split { chunks } => write!(f, "split ({} chunks)", chunks),
            DownloadMode::Whole => write!(f, "whole"),
        }
    }
}

/// A whole resource synthesized as if it came from one ordinary request.
#[derive(Debug, Clone)]
pub struct MergedResource {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) request: HttpRequest,
    pub(crate) body: Bytes,
    pub(crate) mode: DownloadMode,
}

impl MergedResource {
    /// Always 200 OK for merged resources.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The representative request, its `Range` rewritten to the whole resource.
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    /// Reader over the payload, from the first byte to the last.
    pub fn reader(&self) -> Reader<Bytes> {
        self.body.clone().reader()
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};

    fn chunk_with_range(range: Option<&str>) -> ChunkResponse {
        let mut request = HttpRequest::get("http://example.com");
        if let Some(value) = range {
            request.set_header(RANGE, value).unwrap();
        }
        ChunkResponse::new(HttpResponse {
            status: StatusCode::PARTIAL_CONTENT,
            headers: HeaderMap::new(),
            body: Box::new(io::empty()),
            request,
        })
    }

    #[test]
    fn test_requested_start() {
        let chunk = chunk_with_range(Some("bytes=40-59"));
        assert_eq!(chunk.requested_start(100), Ok(40));
        assert_eq!(chunk.range_label(), "bytes=40-59");
    }

    #[test]
    fn test_requested_start_without_range_header() {
        let chunk = chunk_with_range(None);
        assert!(matches!(
            chunk.requested_start(100),
            Err(RangeError::Malformed { .. })
        ));
        assert_eq!(chunk.range_label(), "<no range>");
    }

    #[test]
    fn test_capabilities_splittable() {
        let caps = ResourceCapabilities {
            content_length: 100,
            supports_byte_ranges: true,
        };
        assert!(caps.is_splittable());

        let empty = ResourceCapabilities {
            content_length: 0,
            supports_byte_ranges: true,
        };
        assert!(!empty.is_splittable());
        assert!(!ResourceCapabilities::default().is_splittable());
    }

    #[test]
    fn test_merged_resource_reader() {
        let resource = MergedResource {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            request: HttpRequest::get("http://example.com"),
            body: Bytes::from_static(b"hello"),
            mode: DownloadMode::Whole,
        };
        assert_eq!(resource.content_length(), 5);

        let mut out = String::new();
        resource.reader().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");

        // Each reader starts over at the first byte.
        let mut again = Vec::new();
        resource.reader().read_to_end(&mut again).unwrap();
        assert_eq!(again, b"hello");
    }

    #[test]
    fn test_download_mode_display() {
        assert_eq!(DownloadMode::Split { chunks: 5 }.to_string(), "split (5 chunks)");
        assert_eq!(DownloadMode::Whole.to_string(), "whole");
    }
}
