//! Reassembly of chunk responses into one resource.
//!
//! Responses may arrive in any order. Each one is keyed by the start offset
//! of the `Range` header on the request that produced it, sorted, then
//! drained into a single buffer. A failure on any chunk fails the whole merge.

use std::io::Read;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{DownloadError, DownloadResult};
use crate::sort::By;
use crate::transport::HttpRequest;
use crate::types::{ChunkResponse, DownloadMode, MergedResource};

/// `Range` value written on the merged resource's request.
const WHOLE_RESOURCE_RANGE: &str = "bytes=0-";

/// Merges chunk responses into a single [`MergedResource`].
///
/// `content_length` is the probed resource size; it is only used to resolve
/// each chunk's `Range` header back to a start offset. Every response must
/// carry a parsable `Range` on its request.
pub fn merge(
    mut responses: Vec<ChunkResponse>,
    content_length: u64,
) -> DownloadResult<MergedResource> {
    if responses.is_empty() {
        return Err(DownloadError::NoContent);
    }

    for chunk in &responses {
        chunk.requested_start(content_length)?;
    }

    let by_start = By::new(|a: &ChunkResponse, b: &ChunkResponse| {
        match (
            a.requested_start(content_length),
            b.requested_start(content_length),
        ) {
            (Ok(a), Ok(b)) => a < b,
            _ => false,
        }
    });
    by_start.sort(&mut responses);

    let chunks = responses.len();
    // Chunk headers are only a hint; an oversized claim must not abort the merge.
    let hint = declared_length(&responses).min(content_length);
    let mut responses = responses.into_iter();
    // Non-empty was checked above; the first sorted chunk is the representative.
    let Some(first) = responses.next() else {
        return Err(DownloadError::NoContent);
    };

    let mut buffer = Vec::new();
    if buffer
        .try_reserve(usize::try_from(hint).unwrap_or(usize::MAX))
        .is_err()
    {
        debug!(hint, "Could not pre-allocate merge buffer");
    }
    let representative = drain_into(first, &mut buffer)?;
    for chunk in responses {
        // Each body is dropped as soon as it has been read; on error the
        // remaining iterator (and every unread body) is dropped with it.
        drain_into(chunk, &mut buffer)?;
    }

    let body = Bytes::from(buffer);
    let mut headers = representative.headers;
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
    headers.remove(CONTENT_RANGE);

    let mut request = representative.request;
    request
        .headers
        .insert(RANGE, HeaderValue::from_static(WHOLE_RESOURCE_RANGE));

    debug!(chunks, bytes = body.len(), "Merged chunk responses");

    Ok(MergedResource {
        status: StatusCode::OK,
        headers,
        request,
        body,
        mode: DownloadMode::Split { chunks },
    })
}

/// Sum of the `Content-Length` values the chunk responses declared.
fn declared_length(responses: &[ChunkResponse]) -> u64 {
    responses
        .iter()
        .filter_map(|chunk| chunk.headers().get(CONTENT_LENGTH))
        .filter_map(|value| value.to_str().ok()?.parse::<u64>().ok())
        .fold(0u64, u64::saturating_add)
}

/// Headers and request kept from a drained chunk.
struct Drained {
    headers: HeaderMap,
    request: HttpRequest,
}

/// Reads a chunk body to the end, appends it to `buffer` and releases it.
fn drain_into(chunk: ChunkResponse, buffer: &mut Vec<u8>) -> DownloadResult<Drained> {
    let range = chunk.range_label();
    let response = chunk.into_response();
    let mut body = response.body;

    body.read_to_end(buffer)
        .map_err(|source| DownloadError::BodyRead { range, source })?;
    drop(body);

    Ok(Drained {
        headers: response.headers,
        request: response.request,
    })
}
