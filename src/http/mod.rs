//! HTTP protocol layer module
//!
//! Conditional requests, media types, content encoding, ranges and response
//! assembly, independent of how entries are loaded.

pub mod cache;
pub mod client;
pub mod encoding;
pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use cache::{fingerprint, Validation};
pub use encoding::{Encoders, Encoding};
pub use range::parse_range_header;
pub use request::RequestSignal;
pub use response::{build_405_response, build_status_response, ResponseDescriptor};
