//! Fitted feature scalers.
//!
//! Every supported scaler is an affine map applied column-wise, so it is
//! stored as a `[1, n]` weight and bias pair and applied with broadcasting.

use crate::error::{ServingError, ServingResult};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};

/// Scaler parameters as stored in the artifact bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalerSpec {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// Pass-through.
    Identity { dim: usize },
}

impl ScalerSpec {
    /// Short name used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalerSpec::Standard { .. } => "standard",
            ScalerSpec::MinMax { .. } => "min_max",
            ScalerSpec::Identity { .. } => "identity",
        }
    }

    /// Number of columns the scaler was fitted on.
    pub fn dim(&self) -> usize {
        match self {
            ScalerSpec::Standard { mean, .. } => mean.len(),
            ScalerSpec::MinMax { min, .. } => min.len(),
            ScalerSpec::Identity { dim } => *dim,
        }
    }
}

/// A fitted scaler ready to transform single-row `f64` inputs.
#[derive(Debug)]
pub struct Scaler {
    kind: &'static str,
    dim: usize,
    weight: Tensor,
    bias: Tensor,
}

impl Scaler {
    /// Build a scaler from its stored parameters.
    pub fn from_spec(spec: &ScalerSpec, device: &Device) -> ServingResult<Self> {
        let (weight, bias): (Vec<f64>, Vec<f64>) = match spec {
            ScalerSpec::Standard { mean, scale } => {
                check_len("scale", scale.len(), mean.len())?;
                if let Some(i) = scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
                    return Err(ServingError::artifact_load(format!(
                        "standard scaler has invalid scale {} at column {i}",
                        scale[i]
                    )));
                }
                mean.iter()
                    .zip(scale)
                    .map(|(m, s)| (1.0 / s, -m / s))
                    .unzip()
            }
            ScalerSpec::MinMax { min, scale } => {
                check_len("scale", scale.len(), min.len())?;
                (scale.clone(), min.clone())
            }
            ScalerSpec::Identity { dim } => (vec![1.0; *dim], vec![0.0; *dim]),
        };

        let dim = weight.len();
        if dim == 0 {
            return Err(ServingError::artifact_load("scaler has no columns"));
        }

        Ok(Self {
            kind: spec.kind(),
            dim,
            weight: row_tensor(&weight, device)?,
            bias: row_tensor(&bias, device)?,
        })
    }

    /// Short name of the scaler.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of input columns.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Transform a `[B, dim]` input.
    pub fn transform(&self, input: &Tensor) -> ServingResult<Tensor> {
        let scaled = input
            .broadcast_mul(&self.weight)
            .and_then(|t| t.broadcast_add(&self.bias))
            .map_err(|e| ServingError::prediction(format!("scaler transform failed: {e}")))?;
        Ok(scaled)
    }
}

fn check_len(name: &str, got: usize, expected: usize) -> ServingResult<()> {
    if got != expected {
        return Err(ServingError::artifact_load(format!(
            "scaler {name} has {got} columns, expected {expected}"
        )));
    }
    Ok(())
}

fn row_tensor(values: &[f64], device: &Device) -> ServingResult<Tensor> {
    Tensor::from_slice(values, (1, values.len()), device)
        .map_err(|e| ServingError::artifact_load(format!("scaler tensor init failed: {e}")))
}
