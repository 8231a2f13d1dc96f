//! HTTP response building module
//!
//! `ResponseDescriptor` collects tentative headers while the pipeline runs.
//! Content-Type is held separately and only attached by the body-writing
//! terminals, so 304/412 responses never carry it.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

/// Response under construction
#[derive(Debug, Default, Clone)]
pub struct ResponseDescriptor {
    headers: HeaderMap,
    content_type: Option<HeaderValue>,
}

impl ResponseDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a caller-chosen Content-Type, which takes precedence over
    /// extension lookup and sniffing
    ///
    /// Values that are not valid header text are ignored.
    pub fn with_content_type(content_type: &str) -> Self {
        let mut descriptor = Self::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            descriptor.content_type = Some(value);
        }
        descriptor
    }

    /// Move a Content-Type inserted through [`headers_mut`](Self::headers_mut)
    /// into the caller-preset slot
    ///
    /// A type given to [`with_content_type`](Self::with_content_type) or
    /// [`set_content_type`](Self::set_content_type) is kept over the header.
    pub fn adopt_header_content_type(&mut self) {
        if let Some(value) = self.headers.remove(header::CONTENT_TYPE) {
            if self.content_type.is_none() {
                self.content_type = Some(value);
            }
        }
    }

    /// Explicitly set Content-Type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_ref().and_then(|v| v.to_str().ok())
    }

    pub fn set_content_type(&mut self, value: HeaderValue) {
        self.content_type = Some(value);
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Finish with a status and no body (304, 412, 404, 500)
    pub fn finish_empty(self, status: StatusCode) -> Response<Full<Bytes>> {
        let mut headers = self.headers;
        headers.remove(header::CONTENT_TYPE);
        assemble(status, headers, Bytes::new())
    }

    /// Finish with a full body, attaching Content-Type and Content-Length
    pub fn finish_body(self, status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
        let length = body.len();
        let mut headers = self.finalize_headers();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        assemble(status, headers, body)
    }

    /// Finish a HEAD response: headers describe `content_length` bytes, body is empty
    pub fn finish_head(self, status: StatusCode, content_length: usize) -> Response<Full<Bytes>> {
        let mut headers = self.finalize_headers();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));
        assemble(status, headers, Bytes::new())
    }

    fn finalize_headers(self) -> HeaderMap {
        let mut headers = self.headers;
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        headers
    }
}

fn assemble(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Build a bodiless response with only a status
pub fn build_status_response(status: StatusCode) -> Response<Full<Bytes>> {
    assemble(status, HeaderMap::new(), Bytes::new())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::ALLOW, "GET, HEAD")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            build_status_response(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
