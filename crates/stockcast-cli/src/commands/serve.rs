//! Serve Command Implementation
//!
//! Loads the artifact bundle and serves `POST /predict` over HTTP until
//! Ctrl-C.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use stockcast_serving::config::{DEFAULT_ARTIFACT_PATH, DEFAULT_JITTER_RATIO, DEFAULT_PORT};
use stockcast_serving::{PredictionMode, Server, ServerConfig};
use tracing::info;

/// Serve the quantity prediction model over HTTP
///
/// # Example
///
/// ```bash
/// PORT=8080 stockcast serve --artifact-path /models/quantity_prediction_model.json
/// ```
#[derive(Args, Debug, Clone)]
pub struct ServeCommand {
    /// Path to the artifact bundle
    #[arg(
        long,
        short = 'a',
        default_value = DEFAULT_ARTIFACT_PATH,
        env = "STOCKCAST_ARTIFACT_PATH"
    )]
    pub artifact_path: PathBuf,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// How predicted_quantity is produced: "jitter" or "model"
    #[arg(
        long,
        default_value_t = PredictionMode::Jitter,
        env = "STOCKCAST_PREDICTION_MODE"
    )]
    pub prediction_mode: PredictionMode,

    /// Half-width of the jitter band relative to the input quantity
    #[arg(long, default_value_t = DEFAULT_JITTER_RATIO)]
    pub jitter_ratio: f64,
}

impl ServeCommand {
    /// Build the server configuration from the parsed flags.
    pub fn config(&self) -> ServerConfig {
        ServerConfig::builder()
            .host(self.host.clone())
            .port(self.port)
            .artifact_path(self.artifact_path.clone())
            .prediction_mode(self.prediction_mode)
            .jitter_ratio(self.jitter_ratio)
            .build()
    }

    /// Execute the serve command
    pub async fn run(&self) -> Result<()> {
        info!("Artifact bundle: {:?}", self.artifact_path);
        info!("Prediction mode: {}", self.prediction_mode);

        Server::new(self.config())
            .run()
            .await
            .context("stockcast server failed")?;

        info!("Received shutdown signal, server stopped");
        Ok(())
    }
}
