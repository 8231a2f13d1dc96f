// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served by the demo binary
    pub root: String,
    pub workers: Option<usize>,
    pub keep_alive: bool,
    /// Per-connection timeout in seconds
    pub request_timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
        }
    }
}

/// Serving pipeline configuration
///
/// Read-only once constructed; share it behind an `Arc`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Media-type prefixes that are never content-encoded
    #[serde(default = "default_exempt_prefixes")]
    pub exempt_prefixes: Vec<String>,
    /// Also skip encoding for `text/html` (for proxies that re-encode)
    #[serde(default)]
    pub disable_html_encoding: bool,
    /// Warn when compression did not shrink the payload
    #[serde(default)]
    pub report_warnings: bool,
}

fn default_exempt_prefixes() -> Vec<String> {
    [
        "image/png",
        "image/jpg",
        "image/jpeg",
        "image/gif",
        "image/webp",
        "image/avif",
        "video/",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            exempt_prefixes: default_exempt_prefixes(),
            disable_html_encoding: false,
            report_warnings: false,
        }
    }
}
