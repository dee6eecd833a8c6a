//! Integration tests for split downloads.
//!
//! These tests drive the public API end to end against an in-memory server:
//! - probe → plan → fetch → merge reproduces the resource byte for byte
//! - servers without range support get a single whole-resource GET
//! - a chunk answered with 200 instead of 206 fails the whole download
//! - responses delivered out of order still merge correctly
//!
//! Run with: `cargo test --test split_download_integration`

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rangefetch::fetch::fetch_range;
use rangefetch::merge::merge;
use rangefetch::plan::plan;
use rangefetch::range::parse_range;
use rangefetch::{
    DownloadConfig, DownloadError, DownloadMode, HttpRequest, HttpResponse, HttpTransport,
    RangeClient, Stage, TransportError,
};
use reqwest::header::{HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Method, StatusCode};

// ============================================================================
// Test Server
// ============================================================================

const URL: &str = "http://files.example.com/video.mp4";

/// Minimal in-memory origin server.
struct Origin {
    data: Vec<u8>,
    ranges: bool,
    /// Chunk index (by request order) answered with 200 instead of 206.
    ignore_nth_range: Option<usize>,
    /// Delay later-started requests less so they finish first.
    stagger: bool,
    range_requests: AtomicUsize,
    gets: AtomicUsize,
}

impl Origin {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ranges: true,
            ignore_nth_range: None,
            stagger: false,
            range_requests: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }

    fn response(request: HttpRequest, status: StatusCode, body: Vec<u8>) -> HttpResponse {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
        HttpResponse {
            status,
            headers,
            body: Box::new(Cursor::new(body)),
            request,
        }
    }
}

impl HttpTransport for Origin {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let size = self.data.len() as u64;

        if request.method == Method::HEAD {
            let mut response = Self::response(request, StatusCode::OK, Vec::new());
            response
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(size));
            if self.ranges {
                response
                    .headers
                    .insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            }
            return Ok(response);
        }

        self.gets.fetch_add(1, Ordering::SeqCst);
        let Some(value) = request.header(&RANGE).map(str::to_string) else {
            return Ok(Self::response(request, StatusCode::OK, self.data.clone()));
        };

        let nth = self.range_requests.fetch_add(1, Ordering::SeqCst);
        if !self.ranges || self.ignore_nth_range == Some(nth) {
            return Ok(Self::response(request, StatusCode::OK, self.data.clone()));
        }

        let range = parse_range(&value, size)
            .map_err(|e| TransportError::Request {
                url: request.url.clone(),
                reason: e.to_string(),
            })?[0];
        if self.stagger {
            // Earlier ranges take longer, so completion order is reversed.
            let delay = 5 * (size - range.start) / size.max(1);
            thread::sleep(Duration::from_millis(delay * 4));
        }

        let start = range.start as usize;
        let end = start + range.length as usize;
        let body = self.data[start..end].to_vec();
        Ok(Self::response(request, StatusCode::PARTIAL_CONTENT, body))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Deterministic payload of `len` bytes.
fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8 ^ (i / 256) as u8).collect()
}

fn client_for(origin: &Arc<Origin>, config: DownloadConfig) -> RangeClient {
    let transport: Arc<dyn HttpTransport> = origin.clone();
    RangeClient::with_transport(transport, config)
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Test the full split flow for a 100-byte resource in five chunks.
#[test]
fn test_split_download_reproduces_resource() {
    let data = payload(100);
    let origin = Arc::new(Origin::new(data.clone()));
    let client = client_for(&origin, DownloadConfig::default());

    let resource = client.get_with_byte_range(URL, 5).unwrap();

    assert_eq!(resource.status(), StatusCode::OK);
    assert_eq!(resource.content_length(), 100);
    assert_eq!(resource.mode(), DownloadMode::Split { chunks: 5 });
    assert_eq!(origin.range_requests.load(Ordering::SeqCst), 5);

    let mut body = Vec::new();
    resource.reader().read_to_end(&mut body).unwrap();
    assert_eq!(body, data);
}

/// Test that a server without `Accept-Ranges` gets one plain GET.
#[test]
fn test_without_range_support_falls_back_to_single_get() {
    let mut origin = Origin::new(payload(2048));
    origin.ranges = false;
    let origin = Arc::new(origin);
    let client = client_for(&origin, DownloadConfig::default());

    let resource = client.download(URL).unwrap();

    assert_eq!(resource.mode(), DownloadMode::Whole);
    assert_eq!(resource.body().as_ref(), payload(2048).as_slice());
    assert_eq!(origin.gets.load(Ordering::SeqCst), 1);
    assert_eq!(origin.range_requests.load(Ordering::SeqCst), 0);
}

/// Test that one 200 among the chunk responses fails the download.
#[test]
fn test_full_content_chunk_aborts_download() {
    let mut origin = Origin::new(payload(100));
    origin.ignore_nth_range = Some(2);
    let origin = Arc::new(origin);
    let client = client_for(&origin, DownloadConfig::default());

    let err = client.get_with_byte_range(URL, 5).unwrap_err();

    assert!(matches!(err, DownloadError::RangeUnsupported { .. }));
    assert_eq!(err.stage(), Stage::Fetch);
    // Sequential fetching stops at the failing chunk
    assert_eq!(origin.range_requests.load(Ordering::SeqCst), 3);
}

/// Test that parallel fetching with out-of-order completion merges correctly.
#[test]
fn test_parallel_out_of_order_completion() {
    let data = payload(10_000);
    let mut origin = Origin::new(data.clone());
    origin.stagger = true;
    let origin = Arc::new(origin);
    let client = client_for(&origin, DownloadConfig::default().with_parallel_downloads(8));

    let resource = client.get_with_byte_range(URL, 8).unwrap();

    assert_eq!(resource.body().as_ref(), data.as_slice());
    assert_eq!(resource.request().header(&RANGE), Some("bytes=0-"));
}

/// Test the building blocks directly: plan, fetch in reverse, merge.
#[test]
fn test_manual_pipeline_reverse_order() {
    let data = payload(999);
    let origin = Origin::new(data.clone());

    let plan = plan(999, 6).unwrap();
    let responses: Vec<_> = plan
        .ranges()
        .iter()
        .rev()
        .map(|&range| fetch_range(&origin, URL, range).unwrap())
        .collect();

    let merged = merge(responses, 999).unwrap();
    assert_eq!(merged.body().as_ref(), data.as_slice());
}

/// Test that downloading twice gives byte-identical payloads.
#[test]
fn test_download_is_idempotent() {
    let origin = Arc::new(Origin::new(payload(5000)));
    let client = client_for(&origin, DownloadConfig::default().with_chunks(7));

    let first = client.download(URL).unwrap().into_body();
    let second = client.download(URL).unwrap().into_body();

    assert_eq!(first, second);
}
