//! Error types for the stockcast-serving crate.
//!
//! Every failure on the request path is a [`ServingError`]. The HTTP layer
//! renders it as a single `{"error": ...}` object; only client errors map to
//! `400`, everything else is a `500`.

use thiserror::Error;

/// Result type alias for serving operations.
pub type ServingResult<T> = Result<T, ServingError>;

/// Message returned when the body or one of the required keys is missing.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: current_quantity and month";

/// Message returned when `month` is outside `1..=12`.
pub const MONTH_RANGE_MESSAGE: &str = "Month must be between 1 and 12";

/// Errors that can occur in the serving infrastructure.
#[derive(Debug, Error)]
pub enum ServingError {
    /// Invalid request (missing fields, month out of range).
    #[error("{0}")]
    InvalidRequest(String),

    /// A request field could not be coerced to the required numeric type.
    #[error("{0}")]
    TypeCoercion(String),

    /// The request body is not valid JSON.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The bundle names a feature column the deriver does not produce.
    #[error("Feature column {0:?} is not produced by the feature deriver")]
    FeatureMismatch(String),

    /// Artifact bundle loading failed.
    #[error("Failed to load artifact bundle: {0}")]
    ArtifactLoad(String),

    /// Prediction failed.
    #[error("Prediction failed: {0}")]
    PredictionError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServingError {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create the error for absent body or absent required keys.
    pub fn missing_fields() -> Self {
        Self::InvalidRequest(MISSING_FIELDS_MESSAGE.to_string())
    }

    /// Create the error for an out-of-range month.
    pub fn month_out_of_range() -> Self {
        Self::InvalidRequest(MONTH_RANGE_MESSAGE.to_string())
    }

    /// Create a type coercion error.
    pub fn type_coercion(msg: impl Into<String>) -> Self {
        Self::TypeCoercion(msg.into())
    }

    /// Create an artifact load error.
    pub fn artifact_load(msg: impl Into<String>) -> Self {
        Self::ArtifactLoad(msg.into())
    }

    /// Create a prediction error.
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::PredictionError(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a client error (bad request).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Check if this error prevents the process from serving at all.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactLoad(_) | Self::ConfigError(_) | Self::IoError(_)
        )
    }
}

impl From<candle_core::Error> for ServingError {
    fn from(err: candle_core::Error) -> Self {
        ServingError::PredictionError(err.to_string())
    }
}
