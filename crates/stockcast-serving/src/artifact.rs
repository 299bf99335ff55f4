//! Artifact bundle loading.
//!
//! The bundle is a JSON document holding the fitted scaler, the fitted
//! model, the feature column order used at training time, the evaluation
//! metrics and the training timestamp. It is read once at start-up and
//! shared read-only for the life of the process.

use crate::error::{ServingError, ServingResult};
use crate::inference::{build_model, ModelSpec, Regressor};
use crate::scaler::{Scaler, ScalerSpec};
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Evaluation metrics recorded at training time, passed through verbatim.
pub type Metrics = BTreeMap<String, Number>;

/// On-disk layout of the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub scaler: ScalerSpec,
    pub model: ModelSpec,
    pub feature_cols: Vec<String>,
    pub metrics: Metrics,
    pub training_date: String,
}

/// A loaded, validated artifact bundle.
pub struct ArtifactBundle {
    /// Path the bundle was read from
    pub path: PathBuf,

    /// Feature names in the order the scaler and model expect them
    pub feature_cols: Vec<String>,

    /// Stored evaluation metrics
    pub metrics: Metrics,

    /// Stored training timestamp
    pub training_date: String,

    scaler: Scaler,
    model: Box<dyn Regressor>,
    model_kind: &'static str,
    device: Device,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("path", &self.path)
            .field("feature_cols", &self.feature_cols)
            .field("metrics", &self.metrics)
            .field("training_date", &self.training_date)
            .field("scaler", &self.scaler.kind())
            .field("model", &self.model_kind)
            .finish()
    }
}

/// Serializable overview of a loaded bundle.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub scaler: &'static str,
    pub model: &'static str,
    pub feature_cols: Vec<String>,
    pub metrics: Metrics,
    pub training_date: String,
}

impl ArtifactBundle {
    /// Read and validate the bundle at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ServingError::ArtifactLoad`] if the file is missing, is not
    /// valid JSON, lacks a required key, or holds a scaler or model whose
    /// dimensions disagree with `feature_cols`.
    pub fn load(path: impl AsRef<Path>) -> ServingResult<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Reading artifact bundle from: {:?}", path);

        let bytes = std::fs::read(&path).map_err(|e| {
            ServingError::artifact_load(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: ArtifactFile = serde_json::from_slice(&bytes).map_err(|e| {
            ServingError::artifact_load(format!("cannot parse {}: {e}", path.display()))
        })?;

        let bundle = Self::from_file(path, file)?;
        info!(
            path = %bundle.path.display(),
            model = bundle.model_kind,
            scaler = bundle.scaler.kind(),
            feature_cols = ?bundle.feature_cols,
            training_date = %bundle.training_date,
            "Artifact bundle loaded"
        );
        Ok(bundle)
    }

    /// Build a bundle from an already parsed [`ArtifactFile`].
    pub fn from_file(path: impl Into<PathBuf>, file: ArtifactFile) -> ServingResult<Self> {
        let device = Device::Cpu;
        let n = file.feature_cols.len();
        if n == 0 {
            return Err(ServingError::artifact_load("feature_cols is empty"));
        }

        let scaler = Scaler::from_spec(&file.scaler, &device)?;
        if scaler.dim() != n {
            return Err(ServingError::artifact_load(format!(
                "scaler expects {} columns but feature_cols has {n}",
                scaler.dim()
            )));
        }

        let model = build_model(&file.model, &device)?;
        if model.input_dim() != n {
            return Err(ServingError::artifact_load(format!(
                "model expects {} inputs but feature_cols has {n}",
                model.input_dim()
            )));
        }

        Ok(Self {
            path: path.into(),
            feature_cols: file.feature_cols,
            metrics: file.metrics,
            training_date: file.training_date,
            scaler,
            model,
            model_kind: file.model.kind(),
            device,
        })
    }

    /// Short name of the model family.
    pub fn model_kind(&self) -> &'static str {
        self.model_kind
    }

    /// Short name of the scaler.
    pub fn scaler_kind(&self) -> &'static str {
        self.scaler.kind()
    }

    /// Scale a single ordered feature row and run the model on it.
    pub fn infer(&self, row: &[f64]) -> ServingResult<f64> {
        if row.len() != self.feature_cols.len() {
            return Err(ServingError::internal(format!(
                "input row has {} values, expected {}",
                row.len(),
                self.feature_cols.len()
            )));
        }
        let input = Tensor::from_slice(row, (1, row.len()), &self.device)?;
        let scaled = self.scaler.transform(&input)?;
        let output = self.model.predict(&scaled)?;
        let value = output
            .flatten_all()
            .and_then(|t| t.to_vec1::<f64>())?
            .first()
            .copied()
            .ok_or_else(|| ServingError::prediction("model returned no output"))?;
        Ok(value)
    }

    /// Overview for logging and the `inspect` command.
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            path: self.path.clone(),
            scaler: self.scaler_kind(),
            model: self.model_kind,
            feature_cols: self.feature_cols.clone(),
            metrics: self.metrics.clone(),
            training_date: self.training_date.clone(),
        }
    }
}
