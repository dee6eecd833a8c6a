//! Single range requests.

use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{DownloadError, DownloadResult};
use crate::range::{ByteRange, ContentRange};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ChunkResponse;

/// Requests `range` of `url` and requires a 206 Partial Content answer.
///
/// Any other status, 200 included, means the server ignored the range. That
/// response cannot be merged with partial ones, so it fails the whole
/// download with [`DownloadError::RangeUnsupported`].
pub fn fetch_range(
    transport: &dyn HttpTransport,
    url: &str,
    range: ByteRange,
) -> DownloadResult<ChunkResponse> {
    debug!("Requesting range {}-{}", range.start, range.end);

    let fetch_error = |source| DownloadError::Fetch {
        url: url.to_string(),
        range,
        source,
    };

    let request = HttpRequest::get(url)
        .with_header(RANGE, &range.header_value())
        .map_err(fetch_error)?;
    let response = transport.execute(request).map_err(fetch_error)?;

    if response.status != StatusCode::PARTIAL_CONTENT {
        return Err(DownloadError::RangeUnsupported {
            url: url.to_string(),
            range,
            status: response.status,
        });
    }

    if let Some(value) = response.header(&CONTENT_RANGE) {
        match ContentRange::parse(value) {
            Some(served) if served.range == range => {}
            _ => warn!(
                url,
                requested = %range,
                content_range = value,
                "Content-Range does not match requested range"
            ),
        }
    }

    Ok(ChunkResponse::new(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::transport::tests::{pattern, MockTransport};
    use std::io::Read;

    const URL: &str = "http://example.com/file.bin";

    #[test]
    fn test_fetch_range_success() {
        let mock = MockTransport::with_len(100);
        let chunk = fetch_range(&mock, URL, ByteRange::new(20, 39)).unwrap();

        assert_eq!(chunk.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(chunk.request().header(&RANGE), Some("bytes=20-39"));

        let mut body = Vec::new();
        chunk.into_response().body.read_to_end(&mut body).unwrap();
        assert_eq!(body, pattern(100)[20..40].to_vec());
    }

    #[test]
    fn test_fetch_range_rejects_full_content() {
        let mut mock = MockTransport::with_len(100);
        mock.ignore_range_at = Some(40);

        let err = fetch_range(&mock, URL, ByteRange::new(40, 59)).unwrap_err();
        match err {
            DownloadError::RangeUnsupported { status, range, .. } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(range, ByteRange::new(40, 59));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_range_tolerates_mismatched_content_range() {
        let mut mock = MockTransport::with_len(100);
        mock.shifted_content_range_at = Some(20);

        let chunk = fetch_range(&mock, URL, ByteRange::new(20, 39)).unwrap();
        assert_eq!(chunk.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(chunk.headers().get(CONTENT_RANGE).unwrap(), "bytes 21-40/100");

        let mut body = Vec::new();
        chunk.into_response().body.read_to_end(&mut body).unwrap();
        assert_eq!(body, pattern(100)[20..40].to_vec());
    }

    #[test]
    fn test_fetch_range_transport_failure() {
        let mut mock = MockTransport::with_len(100);
        mock.fail_range_at = Some(0);

        let err = fetch_range(&mock, URL, ByteRange::new(0, 19)).unwrap_err();
        assert!(matches!(err, DownloadError::Fetch { .. }));
        assert_eq!(err.stage(), Stage::Fetch);
    }
}
