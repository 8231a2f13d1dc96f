//! Content-Encoding selection module
//!
//! Picks zstd or Brotli from `Accept-Encoding` and provides the default
//! encoder functions.

use std::fmt;
use std::io::Cursor;

use crate::config::ServeConfig;
use crate::error::EncodeError;

use super::request::RequestSignal;

/// zstd compression level
const ZSTD_LEVEL: i32 = 3;

/// Brotli compression quality (0-11, higher = better compression but slower)
const BROTLI_QUALITY: i32 = 4;

/// Brotli compression window size (10-24, affects memory usage)
const BROTLI_WINDOW: i32 = 20;

/// Compression algorithm applied to a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Zstd,
    Brotli,
}

impl Encoding {
    /// Token used in `Accept-Encoding` / `Content-Encoding`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Brotli => "br",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure function mapping raw bytes to encoded bytes
pub type EncodeFn = fn(&[u8]) -> Result<Vec<u8>, EncodeError>;

/// The two encoder functions used by the pipeline
#[derive(Debug, Clone, Copy)]
pub struct Encoders {
    pub zstd: EncodeFn,
    pub brotli: EncodeFn,
}

impl Encoders {
    /// Run the encoder for `encoding` on `data`
    pub fn encode(&self, encoding: Encoding, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
        match encoding {
            Encoding::Zstd => (self.zstd)(data),
            Encoding::Brotli => (self.brotli)(data),
        }
    }
}

impl Default for Encoders {
    fn default() -> Self {
        Self {
            zstd: encode_zstd,
            brotli: encode_brotli,
        }
    }
}

/// Compress data using zstd
pub fn encode_zstd(data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    zstd::bulk::compress(data, ZSTD_LEVEL).map_err(|source| EncodeError {
        encoding: Encoding::Zstd,
        source,
    })
}

/// Compress data using Brotli
pub fn encode_brotli(data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut output = Vec::with_capacity(data.len() / 2);
    let mut input = Cursor::new(data);
    let params = brotli::enc::BrotliEncoderParams {
        quality: BROTLI_QUALITY,
        lgwin: BROTLI_WINDOW,
        ..Default::default()
    };

    brotli::BrotliCompress(&mut input, &mut output, &params).map_err(|source| EncodeError {
        encoding: Encoding::Brotli,
        source,
    })?;
    Ok(output)
}

/// Choose the encoding from `Accept-Encoding`
///
/// zstd wins over Brotli; anything else (gzip, deflate, identity) yields `None`.
pub fn select_encoding(request: &RequestSignal) -> Option<Encoding> {
    if request.accepts(Encoding::Zstd.as_str()) {
        Some(Encoding::Zstd)
    } else if request.accepts(Encoding::Brotli.as_str()) {
        Some(Encoding::Brotli)
    } else {
        None
    }
}

/// Check whether a media type must be served without Content-Encoding
pub fn is_exempt(config: &ServeConfig, content_type: &str) -> bool {
    if config.disable_html_encoding && content_type.starts_with("text/html") {
        return true;
    }
    config
        .exempt_prefixes
        .iter()
        .any(|prefix| content_type.starts_with(prefix.as_str()))
}
