//! HTTP server for stockcast serving.
//!
//! Exposes `POST /predict` and `GET /health` on an axum router with
//! permissive CORS. The artifact bundle is loaded before the listener is
//! bound, so a broken bundle never reaches the serving state.

use crate::artifact::ArtifactBundle;
use crate::config::ServerConfig;
use crate::error::{ServingError, ServingResult};
use crate::predictor::{PredictionResponse, Predictor};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

impl IntoResponse for ServingError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            warn!("Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the application router around a shared predictor.
pub fn router(predictor: Arc<Predictor>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(predictor)
}

async fn predict(
    State(predictor): State<Arc<Predictor>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ServingError> {
    predictor.handle(&body).map(Json)
}

async fn health(State(predictor): State<Arc<Predictor>>) -> Json<serde_json::Value> {
    let bundle = predictor.bundle();
    Json(json!({
        "status": "ok",
        "model": bundle.model_kind(),
        "prediction_mode": predictor.mode(),
        "feature_cols": bundle.feature_cols,
        "training_date": bundle.training_date,
    }))
}

/// HTTP server for the quantity prediction model.
///
/// # Example
///
/// ```no_run
/// use stockcast_serving::{Server, ServerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::builder()
///     .port(5001)
///     .artifact_path("quantity_prediction_model.json")
///     .build();
///
/// Server::new(config).run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Validate the configuration and load the artifact bundle.
    pub fn prepare(&self) -> ServingResult<Arc<Predictor>> {
        self.config
            .validate()
            .map_err(|e| ServingError::config(e.to_string()))?;

        let bundle = ArtifactBundle::load(&self.config.artifact_path).map_err(|e| {
            error!("Failed to load artifact bundle: {}", e);
            e
        })?;

        let predictor = Predictor::new(Arc::new(bundle))
            .with_mode(self.config.prediction_mode)
            .with_jitter_ratio(self.config.jitter_ratio);
        Ok(Arc::new(predictor))
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> ServingResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> ServingResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let predictor = self.prepare()?;
        info!(
            mode = %self.config.prediction_mode,
            "Starting stockcast server on {}",
            self.config.socket_addr()
        );

        let listener = tokio::net::TcpListener::bind(self.config.socket_addr()).await?;
        axum::serve(listener, router(predictor))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
