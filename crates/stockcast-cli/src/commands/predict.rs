//! Predict Command Implementation
//!
//! Runs one request through the same pipeline the server uses and prints
//! the response body.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use stockcast_serving::config::{DEFAULT_ARTIFACT_PATH, DEFAULT_JITTER_RATIO};
use stockcast_serving::{
    ArtifactBundle, PredictionMode, PredictionResponse, Predictor, ServerConfig,
};

/// Run a single prediction against an artifact bundle
#[derive(Args, Debug, Clone)]
pub struct PredictCommand {
    /// Path to the artifact bundle
    #[arg(
        long,
        short = 'a',
        default_value = DEFAULT_ARTIFACT_PATH,
        env = "STOCKCAST_ARTIFACT_PATH"
    )]
    pub artifact_path: PathBuf,

    /// Quantity observed in the current month
    #[arg(long, short = 'q', allow_hyphen_values = true)]
    pub quantity: f64,

    /// Calendar month (1-12)
    #[arg(long, short = 'm', allow_hyphen_values = true)]
    pub month: i64,

    /// How predicted_quantity is produced: "jitter" or "model"
    #[arg(
        long,
        default_value_t = PredictionMode::Jitter,
        env = "STOCKCAST_PREDICTION_MODE"
    )]
    pub prediction_mode: PredictionMode,

    /// Half-width of the jitter band relative to the input quantity
    #[arg(long, default_value_t = DEFAULT_JITTER_RATIO, allow_hyphen_values = true)]
    pub jitter_ratio: f64,
}

impl PredictCommand {
    /// Configuration shared with `serve`, used to validate the flags.
    pub fn config(&self) -> ServerConfig {
        ServerConfig::builder()
            .artifact_path(self.artifact_path.clone())
            .prediction_mode(self.prediction_mode)
            .jitter_ratio(self.jitter_ratio)
            .build()
    }

    /// Load the bundle and compute the response.
    pub fn predict(&self) -> Result<PredictionResponse> {
        self.config()
            .validate()
            .context("Invalid predict options")?;

        let bundle = ArtifactBundle::load(&self.artifact_path)
            .with_context(|| format!("Failed to load {:?}", self.artifact_path))?;
        let predictor = Predictor::new(Arc::new(bundle))
            .with_mode(self.prediction_mode)
            .with_jitter_ratio(self.jitter_ratio);

        let body = json!({
            "current_quantity": self.quantity,
            "month": self.month,
        });
        let response = predictor.handle(body.to_string().as_bytes())?;
        Ok(response)
    }

    /// Execute the predict command
    pub fn run(&self) -> Result<()> {
        let response = self.predict()?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }
}
