//! Prediction service shared by every request handler.

use crate::artifact::{ArtifactBundle, Metrics};
use crate::config::{PredictionMode, DEFAULT_JITTER_RATIO};
use crate::error::{ServingError, ServingResult};
use crate::features::FeatureVector;
use crate::request::PredictionRequest;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Successful `/predict` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    /// Serialized as a plain JSON integer, including past the `i64` range.
    pub predicted_quantity: i128,
    pub model_metrics: Metrics,
    pub training_date: String,
}

/// Runs the validate, derive, scale, predict pipeline over a shared bundle.
///
/// Holds no mutable state, so a single instance is shared across all
/// request tasks.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ArtifactBundle>,
    mode: PredictionMode,
    jitter_ratio: f64,
}

impl Predictor {
    pub fn new(bundle: Arc<ArtifactBundle>) -> Self {
        Self {
            bundle,
            mode: PredictionMode::default(),
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }

    pub fn with_mode(mut self, mode: PredictionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio;
        self
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn mode(&self) -> PredictionMode {
        self.mode
    }

    /// Handle a raw request body end to end.
    pub fn handle(&self, body: &[u8]) -> ServingResult<PredictionResponse> {
        let request = PredictionRequest::from_body(body)?;
        self.predict(&request)
    }

    /// Produce a response for a validated request.
    ///
    /// The model is always evaluated. In jitter mode its output is then
    /// replaced by the jittered input quantity.
    pub fn predict(&self, request: &PredictionRequest) -> ServingResult<PredictionResponse> {
        self.predict_with_rng(request, &mut rand::thread_rng())
    }

    pub fn predict_with_rng<R: Rng>(
        &self,
        request: &PredictionRequest,
        rng: &mut R,
    ) -> ServingResult<PredictionResponse> {
        let features = FeatureVector::derive(request.current_quantity, request.month);
        let row = features.ordered(&self.bundle.feature_cols)?;
        let model_output = self.bundle.infer(&row)?;

        let predicted_quantity = match self.mode {
            PredictionMode::Jitter => {
                jitter_quantity(request.current_quantity, self.jitter_ratio, rng)?
            }
            PredictionMode::Model => truncate_quantity(model_output)?,
        };

        Ok(PredictionResponse {
            predicted_quantity,
            model_metrics: self.bundle.metrics.clone(),
            training_date: self.bundle.training_date.clone(),
        })
    }
}

/// `trunc(quantity + U(-ratio·|quantity|, ratio·|quantity|))`.
///
/// The offset is drawn as a unit sample scaled by the bound, so the
/// result stays within `[q - bound, q + bound]` without ever building a
/// range wider than `f64` can hold.
pub fn jitter_quantity<R: Rng>(
    quantity: f64,
    ratio: f64,
    rng: &mut R,
) -> ServingResult<i128> {
    if !quantity.is_finite() {
        return Err(ServingError::prediction(format!(
            "cannot jitter non-finite quantity {quantity}"
        )));
    }
    let bound = ratio * quantity.abs();
    let offset = if bound > 0.0 {
        rng.gen_range(-1.0_f64..=1.0) * bound
    } else {
        0.0
    };
    truncate_quantity(quantity + offset)
}

/// Truncate toward zero, rejecting values that do not fit an `i128`.
pub fn truncate_quantity(value: f64) -> ServingResult<i128> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated.abs() >= i128::MAX as f64 {
        return Err(ServingError::prediction(format!(
            "cannot convert {value} to an integer quantity"
        )));
    }
    Ok(truncated as i128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactFile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn bundle(feature_cols: serde_json::Value) -> Arc<ArtifactBundle> {
        let file: ArtifactFile = serde_json::from_value(json!({
            "scaler": {"type": "identity", "dim": 5},
            "model": {"type": "linear", "coefficients": [1.0, 1.0, 1.0, 0.0, 0.0], "intercept": 0.5},
            "feature_cols": feature_cols,
            "metrics": {"r2": 0.91},
            "training_date": "2024-05-01"
        }))
        .unwrap();
        Arc::new(ArtifactBundle::from_file("memory", file).unwrap())
    }

    fn standard_bundle() -> Arc<ArtifactBundle> {
        bundle(json!([
            "prev_month_1",
            "prev_month_2",
            "prev_month_3",
            "month_sin",
            "month_cos"
        ]))
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let q = jitter_quantity(100.0, 0.2, &mut rng).unwrap();
            assert!((80..=120).contains(&q), "{q}");
        }
    }

    #[test]
    fn test_jitter_handles_zero_and_negative() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(jitter_quantity(0.0, 0.2, &mut rng).unwrap(), 0);
        for _ in 0..100 {
            let q = jitter_quantity(-50.0, 0.2, &mut rng).unwrap();
            assert!((-60..=-40).contains(&q), "{q}");
        }
        assert_eq!(jitter_quantity(9.9, 0.0, &mut rng).unwrap(), 9);
        assert!(jitter_quantity(f64::INFINITY, 0.2, &mut rng).is_err());
    }

    #[test]
    fn test_jitter_with_wide_ratio_never_panics() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            match jitter_quantity(1.5e308, 0.9, &mut rng) {
                Ok(q) => assert!(q > 0),
                Err(err) => assert!(matches!(err, ServingError::PredictionError(_))),
            }
        }
        let q = jitter_quantity(1e20, 0.9, &mut rng).unwrap();
        assert!((1e19..=1.9e20).contains(&(q as f64)), "{q}");
    }

    #[test]
    fn test_truncate_quantity() {
        assert_eq!(truncate_quantity(3.99).unwrap(), 3);
        assert_eq!(truncate_quantity(-3.99).unwrap(), -3);
        assert_eq!(truncate_quantity(1e20).unwrap(), 100_000_000_000_000_000_000);
        assert!(truncate_quantity(f64::NAN).is_err());
        assert!(truncate_quantity(1e300).is_err());
    }

    #[test]
    fn test_large_quantity_serializes_as_integer() {
        let predictor = Predictor::new(standard_bundle());
        let mut rng = StdRng::seed_from_u64(11);
        let request = PredictionRequest {
            current_quantity: 1e20,
            month: 5,
        };
        let response = predictor.predict_with_rng(&request, &mut rng).unwrap();
        let low = (1e20 - 0.2 * 1e20f64).trunc() as i128;
        let high = (1e20 + 0.2 * 1e20f64).trunc() as i128;
        assert!((low..=high).contains(&response.predicted_quantity));

        let body = serde_json::to_string(&response).unwrap();
        let rendered = format!("\"predicted_quantity\":{}", response.predicted_quantity);
        assert!(body.contains(&rendered), "{body}");
    }

    #[test]
    fn test_model_mode_reports_model_output() {
        let predictor = Predictor::new(standard_bundle()).with_mode(PredictionMode::Model);
        let response = predictor.handle(br#"{"current_quantity": 10, "month": 4}"#).unwrap();
        // 10 + 10 + 10 + 0.5
        assert_eq!(response.predicted_quantity, 30);
        assert_eq!(response.training_date, "2024-05-01");
    }

    #[test]
    fn test_jitter_mode_passes_through_metadata() {
        let predictor = Predictor::new(standard_bundle());
        let mut rng = StdRng::seed_from_u64(1);
        let request = PredictionRequest {
            current_quantity: 250.0,
            month: 11,
        };
        let response = predictor.predict_with_rng(&request, &mut rng).unwrap();
        assert!((200..=300).contains(&response.predicted_quantity));
        assert_eq!(
            serde_json::to_value(&response.model_metrics).unwrap(),
            json!({"r2": 0.91})
        );
    }

    #[test]
    fn test_unknown_feature_column_is_mismatch() {
        let predictor = Predictor::new(bundle(json!([
            "prev_month_1",
            "prev_month_2",
            "prev_month_3",
            "month_sin",
            "day_of_week"
        ])));
        let err = predictor
            .handle(br#"{"current_quantity": 10, "month": 4}"#)
            .unwrap_err();
        assert!(matches!(err, ServingError::FeatureMismatch(ref c) if c == "day_of_week"));
        assert!(!err.is_client_error());
    }
}
