//! Byte-range values and the `Range` / `Content-Range` header grammar.
//!
//! The transport gives no guarantee that responses come back in the order
//! their requests were issued, so the merge step recovers each chunk's start
//! offset by parsing the `Range` header of the request that produced it.

use std::fmt;

use thiserror::Error;

/// Unit prefix of a `Range` header value.
const BYTES_PREFIX: &str = "bytes=";

/// An inclusive span of byte offsets, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Creates a range covering `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Returns true if the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Range` request header value, e.g. `bytes=0-19`.
    pub fn header_value(&self) -> String {
        format!("{}{}-{}", BYTES_PREFIX, self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A parsed range expressed as offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRange {
    pub start: u64,
    pub length: u64,
}

impl HttpRange {
    /// Converts to an inclusive [`ByteRange`]. Returns `None` for zero-length ranges.
    pub fn to_byte_range(self) -> Option<ByteRange> {
        if self.length == 0 {
            return None;
        }
        Some(ByteRange::new(self.start, self.start + self.length - 1))
    }
}

/// Errors produced while parsing a range expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The expression does not follow the `bytes=a-b` grammar.
    #[error("malformed range {input:?}: {reason}")]
    Malformed { input: String, reason: &'static str },

    /// Every range in the expression starts past the end of the resource.
    #[error("range {input:?} does not overlap a resource of {size} bytes")]
    NoOverlap { input: String, size: u64 },
}

fn malformed(input: &str, reason: &'static str) -> RangeError {
    RangeError::Malformed {
        input: input.to_string(),
        reason,
    }
}

fn parse_offset(input: &str, value: &str) -> Result<u64, RangeError> {
    value
        .parse::<u64>()
        .map_err(|_| malformed(input, "offset is not a non-negative integer"))
}

/// Parses a `Range` header value against a resource of `size` bytes.
///
/// Accepts the multi-range form (`bytes=0-9,20-29`) and returns one
/// [`HttpRange`] per comma-separated element. Supported element forms:
///
/// - `a-b`: bytes `a` through `b`, with `b` clamped to `size - 1`
/// - `a-`: bytes `a` through the end of the resource
/// - `-n`: the final `n` bytes (clamped to `size`)
///
/// Elements starting at or past `size` are skipped; if nothing is left the
/// expression fails with [`RangeError::NoOverlap`].
pub fn parse_range(s: &str, size: u64) -> Result<Vec<HttpRange>, RangeError> {
    let specs = s
        .strip_prefix(BYTES_PREFIX)
        .ok_or_else(|| malformed(s, "missing `bytes=` unit prefix"))?;

    let mut ranges = Vec::new();
    let mut skipped = false;

    for spec in specs.split(',') {
        let spec = spec.trim();
        if spec.is_empty() {
            continue;
        }

        let (start, end) = spec
            .split_once('-')
            .ok_or_else(|| malformed(s, "range element has no `-`"))?;
        let (start, end) = (start.trim(), end.trim());

        let range = if start.is_empty() {
            // Suffix form: the last `n` bytes.
            if end.is_empty() {
                return Err(malformed(s, "suffix range has no length"));
            }
            let suffix = parse_offset(s, end)?.min(size);
            HttpRange {
                start: size - suffix,
                length: suffix,
            }
        } else {
            let start = parse_offset(s, start)?;
            if start >= size {
                skipped = true;
                continue;
            }
            let length = if end.is_empty() {
                size - start
            } else {
                let end = parse_offset(s, end)?;
                if start > end {
                    return Err(malformed(s, "start is after end"));
                }
                end.min(size - 1) - start + 1
            };
            HttpRange { start, length }
        };
        ranges.push(range);
    }

    if ranges.is_empty() {
        if skipped {
            return Err(RangeError::NoOverlap {
                input: s.to_string(),
                size,
            });
        }
        return Err(malformed(s, "no ranges given"));
    }

    Ok(ranges)
}

/// A parsed `Content-Range` response header, e.g. `bytes 0-19/100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub range: ByteRange,
    /// Full resource length, `None` when the server sent `*`.
    pub complete_length: Option<u64>,
}

impl ContentRange {
    /// Parses a `Content-Range` value. Unsatisfied forms (`bytes */100`) yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes")?.trim_start();
        let (span, complete) = rest.split_once('/')?;
        let (start, end) = span.split_once('-')?;
        let start = start.trim().parse::<u64>().ok()?;
        let end = end.trim().parse::<u64>().ok()?;
        if start > end {
            return None;
        }
        let complete_length = match complete.trim() {
            "*" => None,
            n => Some(n.parse::<u64>().ok()?),
        };
        Some(Self {
            range: ByteRange::new(start, end),
            complete_length,
        })
    }
}
