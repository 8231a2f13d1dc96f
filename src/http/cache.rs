//! HTTP cache validation module
//!
//! Provides fingerprint (`ETag`) generation and conditional request handling
//! for `If-Match` / `If-None-Match`.

use chrono::{DateTime, Utc};
use hyper::header::{self, HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};

use super::request::RequestSignal;

/// Format used for `Last-Modified` and `If-Range` dates (IMF-fixdate)
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Bytes of the SHA-256 digest kept in the fingerprint
const FINGERPRINT_BYTES: usize = 8;

/// Generate a strong fingerprint from raw content bytes
///
/// Only the bytes are hashed, never the filename or timestamp. The value is
/// the same across builds and processes.
///
/// # Returns
/// Quoted `ETag` string of 16 hex digits, e.g., `"b94d27b9934d3e08"`
pub fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    format!("\"{}\"", hex::encode(&digest[..FINGERPRINT_BYTES]))
}

/// Format a timestamp as an HTTP date
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Check whether `needle` is one of the comma separated, trimmed tokens
///
/// An empty list only contains the empty needle, so a blank header can never
/// act as a wildcard.
pub fn in_comma_separated(list: &str, needle: &str) -> bool {
    if list.is_empty() {
        return needle.is_empty();
    }
    list.split(',').any(|token| token.trim() == needle)
}

/// Outcome of evaluating the conditional request headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Continue to negotiation and body writing
    Proceed,
    /// `If-Match` did not match: 412, no body
    PreconditionFailed,
    /// `If-None-Match` matched: 304, no body
    NotModified,
}

/// Evaluate caching headers and conditional requests
///
/// Writes the validator headers (`Last-Modified`, `ETag` or
/// `Cache-Control: no-store`) into `headers` and reports whether the pipeline
/// should stop early. A 412 never carries `ETag`.
pub fn validate(
    allow_cache: bool,
    last_modified: Option<&DateTime<Utc>>,
    etag: &str,
    request: &RequestSignal,
    headers: &mut HeaderMap,
) -> Validation {
    if !allow_cache {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        return Validation::Proceed;
    }

    if let Some(time) = last_modified {
        if let Ok(value) = HeaderValue::from_str(&format_http_date(time)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    if let Some(if_match) = request.if_match.as_deref().filter(|v| !v.is_empty()) {
        if !in_comma_separated(if_match, etag) && !in_comma_separated(if_match, "*") {
            return Validation::PreconditionFailed;
        }
    }

    if let Some(if_none_match) = request.if_none_match.as_deref().filter(|v| !v.is_empty()) {
        if in_comma_separated(if_none_match, etag) || in_comma_separated(if_none_match, "*") {
            insert_etag(headers, etag);
            return Validation::NotModified;
        }
    }

    insert_etag(headers, etag);
    Validation::Proceed
}

fn insert_etag(headers: &mut HeaderMap, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signal(if_match: Option<&str>, if_none_match: Option<&str>) -> RequestSignal {
        RequestSignal {
            if_match: if_match.map(ToString::to_string),
            if_none_match: if_none_match.map(ToString::to_string),
            ..RequestSignal::default()
        }
    }

    #[test]
    fn test_fingerprint_shape() {
        let etag = fingerprint(b"hello world");
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(!etag.starts_with("W/"));
        assert_eq!(etag.len(), 18);
    }

    #[test]
    fn test_fingerprint_is_stable_across_builds() {
        assert_eq!(fingerprint(b"hello world"), "\"b94d27b9934d3e08\"");
        assert_eq!(fingerprint(b""), "\"e3b0c44298fc1c14\"");
    }

    #[test]
    fn test_fingerprint_consistency() {
        assert_eq!(fingerprint(b"same content"), fingerprint(b"same content"));
    }

    #[test]
    fn test_fingerprint_single_byte_change() {
        let base = b"the quick brown fox jumps over the lazy dog".to_vec();
        let original = fingerprint(&base);
        for i in 0..base.len() {
            let mut changed = base.clone();
            changed[i] ^= 0x01;
            assert_ne!(fingerprint(&changed), original, "collision at byte {i}");
        }
    }

    #[test]
    fn test_in_comma_separated() {
        assert!(in_comma_separated("\"a\", \"b\"", "\"b\""));
        assert!(in_comma_separated(" * ", "*"));
        assert!(!in_comma_separated("\"a\"", "\"b\""));
        assert!(in_comma_separated("", ""));
        assert!(!in_comma_separated("", "\"a\""));
        assert!(!in_comma_separated("\"a\"", ""));
    }

    #[test]
    fn test_no_store_when_cache_disabled() {
        let mut headers = HeaderMap::new();
        let req = signal(Some("\"nope\""), Some("*"));
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let result = validate(false, Some(&time), "\"abc\"", &req, &mut headers);
        assert_eq!(result, Validation::Proceed);
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert!(headers.get(header::ETAG).is_none());
        assert!(headers.get(header::LAST_MODIFIED).is_none());
    }

    #[test]
    fn test_proceed_sets_etag_and_last_modified() {
        let mut headers = HeaderMap::new();
        let time = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let result = validate(true, Some(&time), "\"abc\"", &signal(None, None), &mut headers);
        assert_eq!(result, Validation::Proceed);
        assert_eq!(headers.get(header::ETAG).unwrap(), "\"abc\"");
        assert_eq!(
            headers.get(header::LAST_MODIFIED).unwrap(),
            "Wed, 21 Oct 2015 07:28:00 GMT"
        );
    }

    #[test]
    fn test_unknown_modification_time_omitted() {
        let mut headers = HeaderMap::new();
        validate(true, None, "\"abc\"", &signal(None, None), &mut headers);
        assert!(headers.get(header::LAST_MODIFIED).is_none());
    }

    #[test]
    fn test_if_match() {
        let mut headers = HeaderMap::new();
        let etag = "\"abc\"";
        assert_eq!(
            validate(true, None, etag, &signal(Some("\"x\", \"y\""), None), &mut headers),
            Validation::PreconditionFailed
        );
        assert_eq!(
            validate(true, None, etag, &signal(Some("\"x\", \"abc\""), None), &mut headers),
            Validation::Proceed
        );
        assert_eq!(
            validate(true, None, etag, &signal(Some("*"), None), &mut headers),
            Validation::Proceed
        );
        // Empty header is treated as absent
        assert_eq!(
            validate(true, None, etag, &signal(Some(""), None), &mut headers),
            Validation::Proceed
        );
    }

    #[test]
    fn test_if_none_match() {
        let etag = "\"abc\"";
        let mut headers = HeaderMap::new();
        assert_eq!(
            validate(true, None, etag, &signal(None, Some("\"abc\"")), &mut headers),
            Validation::NotModified
        );
        assert_eq!(headers.get(header::ETAG).unwrap(), etag);

        let mut headers = HeaderMap::new();
        assert_eq!(
            validate(true, None, etag, &signal(None, Some("*")), &mut headers),
            Validation::NotModified
        );

        let mut headers = HeaderMap::new();
        assert_eq!(
            validate(true, None, etag, &signal(None, Some("\"other\"")), &mut headers),
            Validation::Proceed
        );
        assert_eq!(headers.get(header::ETAG).unwrap(), etag);
    }

    #[test]
    fn test_if_match_checked_before_if_none_match() {
        let mut headers = HeaderMap::new();
        let req = signal(Some("\"other\""), Some("\"abc\""));
        assert_eq!(
            validate(true, None, "\"abc\"", &req, &mut headers),
            Validation::PreconditionFailed
        );
        assert!(headers.get(header::ETAG).is_none());
    }

    #[test]
    fn test_weak_validator_does_not_match() {
        let mut headers = HeaderMap::new();
        let req = signal(None, Some("W/\"abc\""));
        assert_eq!(
            validate(true, None, "\"abc\"", &req, &mut headers),
            Validation::Proceed
        );
    }
}
