//! HTTP serving for the stockcast quantity prediction model.
//!
//! The crate loads a trained artifact bundle (fitted scaler, fitted
//! regressor, feature column order, metrics and training date) once at
//! start-up and answers `POST /predict` requests against it.
//!
//! # Overview
//!
//! - **ArtifactBundle**: immutable bundle loaded from a JSON file
//! - **FeatureVector**: lookback slots plus cyclic month encoding
//! - **Predictor**: validate, derive, scale, predict and respond
//! - **Server**: axum router with permissive CORS
//!
//! # Request flow
//!
//! ```text
//!  POST /predict {"current_quantity": q, "month": m}
//!        │
//!        ▼
//!  PredictionRequest ──► FeatureVector ──► Scaler ──► Regressor
//!                                                         │
//!                          jitter mode: trunc(q ± 20%) ◄──┤
//!                          model mode:  trunc(output)  ◄──┘
//!        │
//!        ▼
//!  {"predicted_quantity", "model_metrics", "training_date"}
//! ```
//!
//! # Making Predictions
//!
//! ```no_run
//! use stockcast_serving::{ArtifactBundle, Predictor};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = ArtifactBundle::load("quantity_prediction_model.json")?;
//! let predictor = Predictor::new(Arc::new(bundle));
//!
//! let response = predictor.handle(br#"{"current_quantity": 120, "month": 5}"#)?;
//! println!("predicted: {}", response.predicted_quantity);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod predictor;
pub mod request;
pub mod scaler;
pub mod server;

pub use artifact::{ArtifactBundle, ArtifactFile, ArtifactSummary, Metrics};
pub use config::{ConfigError, PredictionMode, ServerConfig, ServerConfigBuilder};
pub use error::{ServingError, ServingResult, MISSING_FIELDS_MESSAGE, MONTH_RANGE_MESSAGE};
pub use features::{FeatureVector, FEATURE_NAMES};
pub use inference::{build_model, ModelSpec, Regressor};
pub use predictor::{jitter_quantity, PredictionResponse, Predictor};
pub use request::PredictionRequest;
pub use scaler::{Scaler, ScalerSpec};
pub use server::{router, Server};
