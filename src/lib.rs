//! Optimized content serving for hyper
//!
//! Serves in-memory payloads with strong `ETag` validators, `If-Match` /
//! `If-None-Match` handling, media type negotiation and opportunistic
//! `zstd` / `br` compression. Uncompressed bodies go through a range-capable
//! writer so `Range` and `HEAD` keep working.
//!
//! ```no_run
//! use optserve::config::ServeConfig;
//! use optserve::http::{RequestSignal, ResponseDescriptor};
//! use optserve::serve::{Payload, Pipeline};
//!
//! let pipeline = Pipeline::new(ServeConfig::default());
//! let payload = Payload::new("app.js", "console.log('hi');");
//! let request = RequestSignal::default();
//! let response = pipeline.serve(&request, &payload, ResponseDescriptor::new(), true);
//! assert_eq!(response.status(), 200);
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod serve;
pub mod server;

pub use error::{EncodeError, ServeError};
pub use serve::{FileServer, Payload, Pipeline};
