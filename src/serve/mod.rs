//! Optimized content serving
//!
//! The pipeline turns an in-memory payload plus the request's caching and
//! negotiation headers into a validated, optionally compressed response:
//!
//! 1. validate (`If-Match` → 412, `If-None-Match` → 304)
//! 2. negotiate the media type
//! 3. select an encoding, or hand the raw bytes to the range-capable writer
//!
//! Every call ends in exactly one terminal response and never fails.

pub mod files;
pub mod writer;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

use crate::config::ServeConfig;
use crate::http::cache::{self, Validation};
use crate::http::encoding::{self, Encoders};
use crate::http::{mime, RequestSignal, ResponseDescriptor};
use crate::logger;

pub use files::{DirFs, FileServer, FsEntry, MemoryFs, ReadOnlyFs};
pub use writer::{RangeServer, RangeWriter};

/// Immutable bytes to serve, with the metadata used for headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Logical filename, used for extension lookup and diagnostics
    pub name: String,
    /// Set only through `with_modified`, which drops the epoch
    modified: Option<DateTime<Utc>>,
    pub data: Bytes,
}

impl Payload {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            modified: None,
            data: data.into(),
        }
    }

    /// Attach a modification time; the Unix epoch counts as unknown
    #[must_use]
    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified.filter(|t| t.timestamp() != 0 || t.timestamp_subsec_nanos() != 0);
        self
    }

    /// Last modification time; `None` means unknown and omits `Last-Modified`
    pub const fn modified(&self) -> Option<&DateTime<Utc>> {
        self.modified.as_ref()
    }
}

/// The serving pipeline
///
/// Holds only read-only configuration, so one instance can serve any number
/// of concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<ServeConfig>,
    encoders: Encoders,
    writer: Arc<dyn RangeWriter>,
}

impl Pipeline {
    /// Pipeline with the default encoders and [`RangeServer`]
    pub fn new(config: ServeConfig) -> Self {
        Self {
            config: Arc::new(config),
            encoders: Encoders::default(),
            writer: Arc::new(RangeServer),
        }
    }

    #[must_use]
    pub fn with_encoders(mut self, encoders: Encoders) -> Self {
        self.encoders = encoders;
        self
    }

    #[must_use]
    pub fn with_writer(mut self, writer: impl RangeWriter + 'static) -> Self {
        self.writer = Arc::new(writer);
        self
    }

    pub fn config(&self) -> &ServeConfig {
        &self.config
    }

    /// Serve `payload` for `request`
    ///
    /// `response` may carry a Content-Type chosen by the caller, either preset
    /// or inserted into its headers. With
    /// `allow_cache = false` the response gets `Cache-Control: no-store` and
    /// no validators, whatever conditional headers were sent.
    pub fn serve(
        &self,
        request: &RequestSignal,
        payload: &Payload,
        mut response: ResponseDescriptor,
        allow_cache: bool,
    ) -> Response<Full<Bytes>> {
        response.adopt_header_content_type();

        let etag = if allow_cache {
            cache::fingerprint(&payload.data)
        } else {
            String::new()
        };

        match cache::validate(
            allow_cache,
            payload.modified(),
            &etag,
            request,
            response.headers_mut(),
        ) {
            Validation::PreconditionFailed => {
                return response.finish_empty(StatusCode::PRECONDITION_FAILED);
            }
            Validation::NotModified => return response.finish_empty(StatusCode::NOT_MODIFIED),
            Validation::Proceed => {}
        }

        let content_type = negotiate(&response, payload);
        match HeaderValue::from_str(&content_type) {
            Ok(value) => response.set_content_type(value),
            Err(_) => response.set_content_type(HeaderValue::from_static(mime::OCTET_STREAM)),
        }

        self.write_encoded(request, payload, response, &content_type)
    }

    fn write_encoded(
        &self,
        request: &RequestSignal,
        payload: &Payload,
        mut response: ResponseDescriptor,
        content_type: &str,
    ) -> Response<Full<Bytes>> {
        if encoding::is_exempt(&self.config, content_type) {
            return self.delegate(request, payload, response);
        }

        let Some(chosen) = encoding::select_encoding(request) else {
            return self.delegate(request, payload, response);
        };

        let encoded = match self.encoders.encode(chosen, &payload.data) {
            Ok(encoded) => encoded,
            Err(err) => {
                logger::log_encode_failed(&payload.name, &err);
                return response.finish_body(StatusCode::OK, payload.data.clone());
            }
        };

        if encoded.is_empty() {
            return response.finish_body(StatusCode::OK, payload.data.clone());
        }

        if encoded.len() < payload.data.len() {
            tracing::trace!(
                name = %payload.name,
                encoding = %chosen,
                original = payload.data.len(),
                compressed = encoded.len(),
                "compressed response"
            );
            response
                .headers_mut()
                .insert(header::CONTENT_ENCODING, HeaderValue::from_static(chosen.as_str()));
            return response.finish_body(StatusCode::OK, Bytes::from(encoded));
        }

        if self.config.report_warnings {
            logger::log_inefficient_compression(
                &payload.name,
                content_type,
                payload.data.len(),
                encoded.len(),
            );
        }
        self.delegate(request, payload, response)
    }

    fn delegate(
        &self,
        request: &RequestSignal,
        payload: &Payload,
        response: ResponseDescriptor,
    ) -> Response<Full<Bytes>> {
        self.writer
            .write(response, request, payload.modified(), payload.data.clone())
    }
}

/// Media type precedence: caller-set, extension table, then sniffing
fn negotiate(response: &ResponseDescriptor, payload: &Payload) -> String {
    match response.content_type() {
        Some(preset) if !preset.is_empty() => preset.to_string(),
        _ => mime::detect(&payload.name, &payload.data).to_string(),
    }
}
