//! Range-capable writer
//!
//! Final serialization step for uncompressed bodies. Handles `Range`,
//! `If-Range` and `HEAD`; the pipeline never does partial content itself.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

use crate::http::range::{self, RangeParseResult};
use crate::http::{RequestSignal, ResponseDescriptor};

/// Writes raw bytes for a response whose Content-Type is already set
pub trait RangeWriter: Send + Sync {
    fn write(
        &self,
        response: ResponseDescriptor,
        request: &RequestSignal,
        modified: Option<&DateTime<Utc>>,
        data: Bytes,
    ) -> Response<Full<Bytes>>;
}

/// Default writer: single byte ranges, 416 for unsatisfiable ranges
///
/// Only reads validators already on the response for `If-Range`; it never
/// adds `ETag` or `Last-Modified` of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct RangeServer;

impl RangeWriter for RangeServer {
    fn write(
        &self,
        mut response: ResponseDescriptor,
        request: &RequestSignal,
        modified: Option<&DateTime<Utc>>,
        data: Bytes,
    ) -> Response<Full<Bytes>> {
        let total = data.len();
        response
            .headers_mut()
            .insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let parsed = if range::if_range_allows(request.if_range.as_deref(), etag.as_deref(), modified) {
            range::parse_range_header(request.range.as_deref(), total)
        } else {
            RangeParseResult::None
        };

        match parsed {
            RangeParseResult::Valid(byte_range) => {
                if let Ok(value) = HeaderValue::from_str(&byte_range.content_range(total)) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                if request.is_head {
                    return response.finish_head(StatusCode::PARTIAL_CONTENT, byte_range.len());
                }
                let body = data.slice(byte_range.start..=byte_range.end);
                response.finish_body(StatusCode::PARTIAL_CONTENT, body)
            }
            RangeParseResult::NotSatisfiable => {
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{total}")) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                response.finish_empty(StatusCode::RANGE_NOT_SATISFIABLE)
            }
            RangeParseResult::None => {
                if request.is_head {
                    return response.finish_head(StatusCode::OK, total);
                }
                response.finish_body(StatusCode::OK, data)
            }
        }
    }
}
