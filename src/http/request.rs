//! Request signal module
//!
//! Read-only view of the inbound headers the serving pipeline consumes.

use hyper::header::{self, HeaderMap, HeaderName};
use hyper::Method;

/// Inbound headers relevant to validation, negotiation and range writing
///
/// Header values that are not visible ASCII are decoded lossily, so a
/// malformed precondition stays present and simply never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSignal {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub accept_encoding: Option<String>,
    /// `Range` header, consumed by the range-capable writer only
    pub range: Option<String>,
    /// `If-Range` header, consumed by the range-capable writer only
    pub if_range: Option<String>,
    /// HEAD requests get headers without a body
    pub is_head: bool,
}

impl RequestSignal {
    /// Extract the signal from a request's method and headers
    pub fn from_parts(method: &Method, headers: &HeaderMap) -> Self {
        Self {
            if_match: header_string(headers, &header::IF_MATCH),
            if_none_match: header_string(headers, &header::IF_NONE_MATCH),
            accept_encoding: header_string(headers, &header::ACCEPT_ENCODING),
            range: header_string(headers, &header::RANGE),
            if_range: header_string(headers, &header::IF_RANGE),
            is_head: method == Method::HEAD,
        }
    }

    /// Extract the signal from a full request
    pub fn from_request<B>(req: &hyper::Request<B>) -> Self {
        Self::from_parts(req.method(), req.headers())
    }

    /// Case-insensitive containment check on `Accept-Encoding`
    ///
    /// q-values are ignored; `br;q=0` still counts as accepting `br`.
    pub fn accepts(&self, coding: &str) -> bool {
        self.accept_encoding
            .as_deref()
            .is_some_and(|v| v.to_ascii_lowercase().contains(coding))
    }
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
