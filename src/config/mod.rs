// Configuration module entry point
// Loads application configuration from file and environment

mod types;

use std::net::SocketAddr;

use crate::error::ServeError;

pub use types::{Config, LoggingConfig, ServeConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("OPTSERVE").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.root", "public")?
            .set_default("server.keep_alive", true)?
            .set_default("server.request_timeout", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from the default "config" file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServeError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| ServeError::Address(format!("{addr}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/config").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.root, "public");
        assert!(cfg.server.keep_alive);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.serve, ServeConfig::default());
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_invalid_address() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(cfg.get_socket_addr(), Err(ServeError::Address(_))));
    }

    #[test]
    fn test_serve_config_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serve.toml");
        std::fs::write(
            &path,
            "[serve]\nexempt_prefixes = [\"application/zip\"]\ndisable_html_encoding = true\n",
        )
        .unwrap();

        let stem = dir.path().join("serve");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.serve.exempt_prefixes, vec!["application/zip".to_string()]);
        assert!(cfg.serve.disable_html_encoding);
        assert!(!cfg.serve.report_warnings);
    }
}
