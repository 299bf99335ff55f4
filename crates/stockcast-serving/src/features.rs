//! Feature derivation for quantity prediction.
//!
//! No per-product history is tracked, so the three lookback slots all carry
//! the current quantity. The month is encoded cyclically so that December and
//! January end up next to each other.

use crate::error::{ServingError, ServingResult};
use std::f64::consts::PI;

/// Names of the features produced by [`FeatureVector::derive`].
pub const FEATURE_NAMES: [&str; 5] = [
    "prev_month_1",
    "prev_month_2",
    "prev_month_3",
    "month_sin",
    "month_cos",
];

/// Derived model input for a single request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub prev_month_1: f64,
    pub prev_month_2: f64,
    pub prev_month_3: f64,
    pub month_sin: f64,
    pub month_cos: f64,
}

impl FeatureVector {
    /// Derive the features for `current_quantity` observed in `month` (1-12).
    pub fn derive(current_quantity: f64, month: u32) -> Self {
        let angle = 2.0 * PI * f64::from(month) / 12.0;
        Self {
            prev_month_1: current_quantity,
            prev_month_2: current_quantity,
            prev_month_3: current_quantity,
            month_sin: angle.sin(),
            month_cos: angle.cos(),
        }
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "prev_month_1" => Some(self.prev_month_1),
            "prev_month_2" => Some(self.prev_month_2),
            "prev_month_3" => Some(self.prev_month_3),
            "month_sin" => Some(self.month_sin),
            "month_cos" => Some(self.month_cos),
            _ => None,
        }
    }

    /// Lay the features out in the order the scaler was fitted with.
    pub fn ordered(&self, feature_cols: &[String]) -> ServingResult<Vec<f64>> {
        feature_cols
            .iter()
            .map(|col| {
                self.get(col)
                    .ok_or_else(|| ServingError::FeatureMismatch(col.clone()))
            })
            .collect()
    }
}
