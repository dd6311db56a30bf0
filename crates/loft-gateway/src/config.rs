//! Gateway configuration with layered loading.
//!
//! Settings come from `gateway.toml` merged with `GATEWAY_`-prefixed
//! environment variables (e.g. `GATEWAY_UPSTREAM__BASE`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::{Error as FigmentError, Figment};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error from the Figment configuration library.
    #[error("configuration error: {0}")]
    Figment(Box<FigmentError>),

    /// The specified configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<FigmentError> for ConfigError {
    fn from(err: FigmentError) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Artifact storage upstream settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl GatewayConfig {
    /// Load configuration from the default path (`gateway.toml`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("gateway.toml")
    }

    /// Load configuration from the specified file path.
    ///
    /// Environment variables prefixed with `GATEWAY_` override file settings.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("GATEWAY_").split("__").lowercase(false));

        figment.extract::<Self>().map_err(ConfigError::from)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new().merge(Toml::string(content));
        figment.extract::<Self>().map_err(ConfigError::from)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address and port to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

const fn default_bind_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8000)
}

/// Artifact storage upstream configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the artifact store; the project key and request path are
    /// appended per request.
    #[serde(default = "default_base")]
    pub base: String,

    /// Document served for bare root requests.
    #[serde(default = "default_index_document")]
    pub index_document: String,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Upstream request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            index_document: default_index_document(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base() -> String {
    "https://s3.us-east-1.amazonaws.com/loft-sites".to_owned()
}

fn default_index_document() -> String {
    "index.html".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = GatewayConfig::parse("").unwrap();
        assert_eq!(config.server.bind_address.port(), 8000);
        assert_eq!(config.upstream.index_document, "index.html");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            bind_address = "0.0.0.0:8080"

            [upstream]
            base = "http://minio.internal:9000/sites"
            index_document = "home.html"
            request_timeout_secs = 10
        "#;

        let config = GatewayConfig::parse(toml).unwrap();
        assert_eq!(config.server.bind_address.port(), 8080);
        assert_eq!(config.upstream.base, "http://minio.internal:9000/sites");
        assert_eq!(config.upstream.index_document, "home.html");
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(10));
    }
}
