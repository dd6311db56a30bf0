//! Control plane configuration with layered loading.
//!
//! Settings come from `control.toml` merged with `CONTROL_`-prefixed
//! environment variables (e.g. `CONTROL_BUS__URL` overrides `[bus] url`).

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

/// Top-level control plane configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Execution backend (builder service) settings.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Log bus (Redis/Valkey) settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Preview URL settings for freshly queued deployments.
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl ControlConfig {
    /// Load configuration from the default path (`control.toml`).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("control.toml")
    }

    /// Load configuration from the specified file path.
    ///
    /// Environment variables prefixed with `CONTROL_` override file settings.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("CONTROL_").split("__").lowercase(false));

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
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9000)
}

/// Execution backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// URL of the builder service's job-submission endpoint.
    #[serde(default = "default_executor_endpoint")]
    pub endpoint: String,

    /// Submission request timeout in seconds.
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
}

impl ExecutorConfig {
    /// Submission timeout as a [`Duration`].
    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_executor_endpoint(),
            submit_timeout_secs: default_submit_timeout_secs(),
        }
    }
}

fn default_executor_endpoint() -> String {
    "http://127.0.0.1:9200/jobs".to_owned()
}

const fn default_submit_timeout_secs() -> u64 {
    10
}

/// Log bus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Redis/Valkey connection URL.
    #[serde(default = "default_bus_url")]
    pub url: String,

    /// Initial reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    /// Maximum reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

impl BusConfig {
    /// Initial reconnect backoff as a [`Duration`].
    #[must_use]
    pub const fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    /// Maximum reconnect backoff as a [`Duration`].
    #[must_use]
    pub const fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: default_bus_url(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

fn default_bus_url() -> String {
    "redis://127.0.0.1:6379".to_owned()
}

const fn default_reconnect_initial_ms() -> u64 {
    500
}

const fn default_reconnect_max_ms() -> u64 {
    15_000
}

/// Preview URL configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// Domain under which deployed sites are served, e.g. `localhost:8000`.
    /// The project slug becomes the leftmost label.
    #[serde(default = "default_preview_domain")]
    pub domain: String,

    /// URL scheme for preview links.
    #[serde(default = "default_preview_scheme")]
    pub scheme: String,
}

impl PreviewConfig {
    /// The preview URL for a project slug.
    #[must_use]
    pub fn url_for(&self, slug: &str) -> String {
        format!("{}://{}.{}", self.scheme, slug, self.domain)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            domain: default_preview_domain(),
            scheme: default_preview_scheme(),
        }
    }
}

fn default_preview_domain() -> String {
    "localhost:8000".to_owned()
}

fn default_preview_scheme() -> String {
    "http".to_owned()
}
