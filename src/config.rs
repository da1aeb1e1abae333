//! Startup configuration
//!
//! The binary fills these from command-line flags and environment variables;
//! library users can build them directly. Every config is validated before a
//! socket is bound, so a bad value stops startup instead of surfacing later.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::error::{AarogyaError, Result};

/// Default inference service port
pub const DEFAULT_SERVE_PORT: u16 = 5001;
/// Default gateway port
pub const DEFAULT_GATEWAY_PORT: u16 = 8000;
/// Default model artifact path
pub const DEFAULT_MODEL_PATH: &str = "disease_model.json";
/// Default training corpus path
pub const DEFAULT_CORPUS_PATH: &str = "delhi_disease_data_10000.csv";
/// Default environment label
pub const DEFAULT_ENVIRONMENT: &str = "production";
/// Default upstream inference service URL
pub const DEFAULT_UPSTREAM_URL: &str = "http://prediction-service:5001";

/// Inference service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Model artifact path
    pub model_path: PathBuf,
    /// Training corpus path
    pub corpus_path: PathBuf,
    /// Serve the built-in demo bundle instead of files
    pub demo: bool,
    /// Environment label reported by `/health`
    pub environment: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_SERVE_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            corpus_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            demo: false,
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

impl ServeConfig {
    /// Check the settings
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] for an unusable address
    /// or an empty environment label.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.environment.trim().is_empty() {
            return Err(AarogyaError::InvalidConfiguration(
                "environment label must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Address to bind
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] if host and port do not
    /// form a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

/// Per-route deadlines for calls from the gateway to the inference service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// `POST /predict`
    pub predict: Duration,
    /// `POST /predict/batch`
    pub batch: Duration,
    /// `GET /info`
    pub info: Duration,
    /// `GET /health`
    pub health: Duration,
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self {
            predict: Duration::from_secs(30),
            batch: Duration::from_secs(60),
            info: Duration::from_secs(10),
            health: Duration::from_secs(5),
        }
    }
}

impl UpstreamTimeouts {
    /// Build from whole seconds
    #[must_use]
    pub fn from_secs(predict: u64, batch: u64, info: u64, health: u64) -> Self {
        Self {
            predict: Duration::from_secs(predict),
            batch: Duration::from_secs(batch),
            info: Duration::from_secs(info),
            health: Duration::from_secs(health),
        }
    }

    /// Check that every deadline is non-zero
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] naming the zero timeout.
    pub fn validate(&self) -> Result<()> {
        for (name, timeout) in [
            ("predict", self.predict),
            ("batch", self.batch),
            ("info", self.info),
            ("health", self.health),
        ] {
            if timeout.is_zero() {
                return Err(AarogyaError::InvalidConfiguration(format!(
                    "{name} timeout must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Proxy gateway settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Base URL of the inference service
    pub upstream_url: String,
    /// Accepted API tokens
    pub tokens: Vec<String>,
    /// Upstream deadlines
    pub timeouts: UpstreamTimeouts,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_GATEWAY_PORT,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            tokens: Vec::new(),
            timeouts: UpstreamTimeouts::default(),
        }
    }
}

impl GatewayConfig {
    /// Check the settings
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] for a bad address, a
    /// non-HTTP upstream URL, no tokens, a blank token, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if !(self.upstream_url.starts_with("http://") || self.upstream_url.starts_with("https://"))
        {
            return Err(AarogyaError::InvalidConfiguration(format!(
                "upstream URL must start with http:// or https://, got '{}'",
                self.upstream_url
            )));
        }
        if self.tokens.is_empty() {
            return Err(AarogyaError::InvalidConfiguration(
                "at least one API token is required".to_string(),
            ));
        }
        if self.tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(AarogyaError::InvalidConfiguration(
                "API tokens must not be blank".to_string(),
            ));
        }
        self.timeouts.validate()
    }

    /// Address to bind
    ///
    /// # Errors
    ///
    /// Returns [`AarogyaError::InvalidConfiguration`] if host and port do not
    /// form a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| AarogyaError::InvalidConfiguration(format!("Invalid address: {e}")))
}
