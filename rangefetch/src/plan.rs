//! Chunk planning.
//!
//! Splits `[0, content_length)` into `chunks` nearly-equal inclusive ranges.
//! Every chunk is `content_length / chunks` bytes long except the last one,
//! which absorbs the remainder so the plan always ends at `content_length - 1`.

use tracing::warn;

use crate::error::{DownloadError, DownloadResult};
use crate::range::ByteRange;

/// Ordered, gap-free, non-overlapping list of chunk ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    content_length: u64,
    ranges: Vec<ByteRange>,
}

impl ChunkPlan {
    /// Total number of bytes the plan covers.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Planned ranges in ascending start order.
    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    /// Number of chunks in the plan.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl IntoIterator for ChunkPlan {
    type Item = ByteRange;
    type IntoIter = std::vec::IntoIter<ByteRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.into_iter()
    }
}

/// Plans `chunks` ranges over a resource of `content_length` bytes.
///
/// A zero length or zero chunk count is rejected with
/// [`DownloadError::InvalidPlan`]. Asking for more chunks than there are bytes
/// clamps the chunk count to `content_length`, so no range is ever empty.
pub fn plan(content_length: u64, chunks: usize) -> DownloadResult<ChunkPlan> {
    if content_length == 0 || chunks == 0 {
        return Err(DownloadError::InvalidPlan {
            content_length,
            chunks,
        });
    }

    let mut count = chunks as u64;
    if count > content_length {
        warn!(
            chunks,
            content_length, "More chunks than bytes, clamping chunk count"
        );
        count = content_length;
    }

    let chunk_size = content_length / count;
    let ranges = (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i == count - 1 {
                content_length - 1
            } else {
                start + chunk_size - 1
            };
            ByteRange::new(start, end)
        })
        .collect();

    Ok(ChunkPlan {
        content_length,
        ranges,
    })
}
