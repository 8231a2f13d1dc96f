//! Error types
//!
//! None of these reach the client as an error body: encoder failures fall
//! back to a raw response, filesystem failures become 404 or 500.

use std::io;

use thiserror::Error;

use crate::http::encoding::Encoding;

/// An encoder function failed on the payload
#[derive(Debug, Error)]
#[error("{encoding} encoding failed: {source}")]
pub struct EncodeError {
    pub encoding: Encoding,
    #[source]
    pub source: io::Error,
}

/// Failures while resolving an entry or starting the server
#[derive(Debug, Error)]
pub enum ServeError {
    /// The entry could not be opened (maps to 404)
    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The entry was opened but could not be read (maps to 500)
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address: {0}")]
    Address(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
