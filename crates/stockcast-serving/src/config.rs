//! Server configuration for the stockcast serving process.
//!
//! This module provides the [`ServerConfig`] used to bind the HTTP listener,
//! locate the artifact bundle and pick how `predicted_quantity` is produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5001;

/// Default artifact bundle location, relative to the working directory.
pub const DEFAULT_ARTIFACT_PATH: &str = "quantity_prediction_model.json";

/// Default half-width of the jitter band, as a fraction of the input quantity.
pub const DEFAULT_JITTER_RATIO: f64 = 0.2;

/// How the reported `predicted_quantity` is produced.
///
/// The model is evaluated in both modes. In [`PredictionMode::Jitter`] its
/// output is discarded and the response carries the input quantity perturbed
/// by a uniform random offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Input quantity plus uniform jitter (shipped behaviour).
    #[default]
    Jitter,
    /// Truncated model output.
    Model,
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionMode::Jitter => f.write_str("jitter"),
            PredictionMode::Model => f.write_str("model"),
        }
    }
}

impl FromStr for PredictionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jitter" => Ok(PredictionMode::Jitter),
            "model" => Ok(PredictionMode::Model),
            other => Err(ConfigError::InvalidPredictionMode(other.to_string())),
        }
    }
}

/// Configuration for the HTTP serving process.
///
/// # Example
///
/// ```
/// use stockcast_serving::config::{PredictionMode, ServerConfig};
///
/// let config = ServerConfig::builder()
///     .host("127.0.0.1")
///     .port(5001)
///     .artifact_path("/models/quantity_prediction_model.json")
///     .prediction_mode(PredictionMode::Model)
///     .build();
/// assert_eq!(config.socket_addr(), "127.0.0.1:5001");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    pub host: String,

    /// Port to listen on (default: 5001)
    pub port: u16,

    /// Path to the serialized artifact bundle
    pub artifact_path: PathBuf,

    /// How `predicted_quantity` is produced
    pub prediction_mode: PredictionMode,

    /// Half-width of the jitter band relative to the input quantity
    pub jitter_ratio: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            prediction_mode: PredictionMode::default(),
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Get the socket address string for binding.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.artifact_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyArtifactPath);
        }
        if !self.jitter_ratio.is_finite() || !(0.0..1.0).contains(&self.jitter_ratio) {
            return Err(ConfigError::InvalidJitterRatio(self.jitter_ratio));
        }
        Ok(())
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    artifact_path: Option<PathBuf>,
    prediction_mode: Option<PredictionMode>,
    jitter_ratio: Option<f64>,
}

impl ServerConfigBuilder {
    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port number.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the artifact bundle path.
    pub fn artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    /// Set the prediction mode.
    pub fn prediction_mode(mut self, mode: PredictionMode) -> Self {
        self.prediction_mode = Some(mode);
        self
    }

    /// Set the jitter ratio.
    pub fn jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = Some(ratio);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig {
            host: self.host.unwrap_or(default.host),
            port: self.port.unwrap_or(default.port),
            artifact_path: self.artifact_path.unwrap_or(default.artifact_path),
            prediction_mode: self.prediction_mode.unwrap_or(default.prediction_mode),
            jitter_ratio: self.jitter_ratio.unwrap_or(default.jitter_ratio),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port number: port cannot be 0")]
    InvalidPort,

    /// Empty artifact path
    #[error("Artifact path cannot be empty")]
    EmptyArtifactPath,

    /// Jitter ratio outside [0, 1)
    #[error("Invalid jitter ratio {0}: must be in [0, 1)")]
    InvalidJitterRatio(f64),

    /// Unknown prediction mode
    #[error("Unknown prediction mode {0:?}: expected \"jitter\" or \"model\"")]
    InvalidPredictionMode(String),
}
