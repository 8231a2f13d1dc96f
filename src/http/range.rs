//! HTTP Range request parsing module
//!
//! Single-range `bytes=` parsing and `If-Range` evaluation (RFC 9110 §14).

use chrono::{DateTime, Utc};

use super::cache::format_http_date;

/// Parsed Range request, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes covered
    #[inline]
    pub const fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// `Content-Range` header value for a payload of `total` bytes
    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(ByteRange),
    /// Range not satisfiable - should return 416
    NotSatisfiable,
    /// No Range header or malformed (ignore, return full content)
    None,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// Multiple ranges are ignored and the full content is served.
///
/// # Examples
/// ```
/// use optserve::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(ranges) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None;
    };

    if ranges.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = ranges.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }
    parse_standard_range(start_str, end_str, file_size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix larger than file covers the whole file
    RangeParseResult::Valid(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        let Ok(e) = end_str.parse::<usize>() else {
            return RangeParseResult::None;
        };
        if e < start {
            return RangeParseResult::None;
        }
        e.min(file_size - 1)
    };

    RangeParseResult::Valid(ByteRange { start, end })
}

/// Decide whether a `Range` header may be honoured given `If-Range`
///
/// An entity tag must match `etag` strongly; a date must equal the
/// modification time exactly. With no `If-Range` the range always applies.
pub fn if_range_allows(
    if_range: Option<&str>,
    etag: Option<&str>,
    modified: Option<&DateTime<Utc>>,
) -> bool {
    let Some(value) = if_range.map(str::trim).filter(|v| !v.is_empty()) else {
        return true;
    };

    if value.starts_with('"') {
        return etag.is_some_and(|tag| tag == value);
    }
    if value.starts_with("W/") {
        return false;
    }
    modified.is_some_and(|time| format_http_date(time) == value)
}
