//! Regression models for quantity prediction.
//!
//! Training happens elsewhere; the artifact bundle carries the fitted
//! attributes of a scikit-learn estimator and a `type` tag naming its
//! family. Dense families are evaluated with Candle in `f64`. Tree
//! ensembles walk their node arrays directly.
//!
//! Every model consumes a scaled `[B, input_dim]` tensor and returns `[B, 1]`.

use crate::error::{ServingError, ServingResult};
use candle_core::{DType, Device, Tensor};
use serde::{Deserialize, Serialize};

/// Model specification stored in the artifact bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// `LinearRegression` / `Ridge` style model.
    Linear(LinearSpec),
    /// `MLPRegressor`.
    Mlp(MlpSpec),
    /// `RandomForestRegressor` / `ExtraTreesRegressor`.
    Forest(ForestSpec),
}

impl ModelSpec {
    /// Short name used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::Linear(_) => "linear",
            ModelSpec::Mlp(_) => "mlp",
            ModelSpec::Forest(_) => "forest",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSpec {
    #[serde(alias = "coef")]
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

/// Fitted `MLPRegressor` attributes.
///
/// `coefs[i]` is the `[in, out]` weight matrix of layer `i` (one inner
/// vector per input unit) and `intercepts[i]` its bias. The last layer
/// has a single output and no activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpSpec {
    #[serde(default)]
    pub activation: Activation,
    pub coefs: Vec<Vec<Vec<f64>>>,
    pub intercepts: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSpec {
    pub input_dim: usize,
    pub trees: Vec<TreeSpec>,
}

/// One regression tree in flat array layout. Node `i` is a leaf when
/// `children_left[i] == -1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// Hidden-layer activation, named as in `MLPRegressor(activation=...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    #[default]
    Relu,
}

impl Activation {
    fn apply(self, t: Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Identity => Ok(t),
            Activation::Logistic => candle_nn::ops::sigmoid(&t),
            Activation::Tanh => t.tanh(),
            Activation::Relu => t.relu(),
        }
    }
}

/// Fitted regressor interface.
pub trait Regressor: Send + Sync {
    fn input_dim(&self) -> usize;
    fn predict(&self, input: &Tensor) -> ServingResult<Tensor>;
}

/// Build a regressor from its stored spec.
pub fn build_model(spec: &ModelSpec, device: &Device) -> ServingResult<Box<dyn Regressor>> {
    match spec {
        ModelSpec::Linear(s) => Ok(Box::new(LinearModel::from_spec(s, device)?)),
        ModelSpec::Mlp(s) => Ok(Box::new(MlpModel::from_spec(s, device)?)),
        ModelSpec::Forest(s) => Ok(Box::new(ForestModel::from_spec(s)?)),
    }
}

/// A dense layer `x · W + b` with `W: [in, out]` and `b: [out]`.
#[derive(Debug)]
struct Dense {
    weight: Tensor,
    bias: Tensor,
}

impl Dense {
    fn new(rows: &[Vec<f64>], bias: &[f64], device: &Device) -> ServingResult<Self> {
        let fan_out = bias.len();
        if let Some(r) = rows.iter().position(|row| row.len() != fan_out) {
            return Err(ServingError::artifact_load(format!(
                "weight row {r} has {} columns, bias has {fan_out}",
                rows[r].len()
            )));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let init_err =
            |e: candle_core::Error| ServingError::artifact_load(format!("dense layer init: {e}"));
        Ok(Self {
            weight: Tensor::from_vec(flat, (rows.len(), fan_out), device).map_err(init_err)?,
            bias: Tensor::from_slice(bias, fan_out, device).map_err(init_err)?,
        })
    }

    fn forward(&self, x: &Tensor) -> ServingResult<Tensor> {
        x.matmul(&self.weight)
            .and_then(|y| y.broadcast_add(&self.bias))
            .map_err(|e| ServingError::prediction(format!("dense layer failed: {e}")))
    }
}

#[derive(Debug)]
struct LinearModel {
    input_dim: usize,
    layer: Dense,
}

impl LinearModel {
    fn from_spec(spec: &LinearSpec, device: &Device) -> ServingResult<Self> {
        if spec.coefficients.is_empty() {
            return Err(ServingError::artifact_load("linear model has no coefficients"));
        }
        let column: Vec<Vec<f64>> = spec.coefficients.iter().map(|&c| vec![c]).collect();
        Ok(Self {
            input_dim: column.len(),
            layer: Dense::new(&column, &[spec.intercept], device)?,
        })
    }
}

impl Regressor for LinearModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, input: &Tensor) -> ServingResult<Tensor> {
        self.layer.forward(input)
    }
}

#[derive(Debug)]
struct MlpModel {
    input_dim: usize,
    activation: Activation,
    layers: Vec<Dense>,
}

impl MlpModel {
    fn from_spec(spec: &MlpSpec, device: &Device) -> ServingResult<Self> {
        if spec.coefs.is_empty() || spec.coefs.len() != spec.intercepts.len() {
            return Err(ServingError::artifact_load(format!(
                "mlp has {} weight matrices and {} intercept vectors",
                spec.coefs.len(),
                spec.intercepts.len()
            )));
        }

        let input_dim = spec.coefs[0].len();
        let mut fan_in = input_dim;
        let mut layers = Vec::with_capacity(spec.coefs.len());
        for (i, (rows, bias)) in spec.coefs.iter().zip(&spec.intercepts).enumerate() {
            if rows.len() != fan_in || fan_in == 0 {
                return Err(ServingError::artifact_load(format!(
                    "mlp layer {i} has {} input rows, expected {fan_in}",
                    rows.len()
                )));
            }
            layers.push(Dense::new(rows, bias, device)?);
            fan_in = bias.len();
        }
        if fan_in != 1 {
            return Err(ServingError::artifact_load(format!(
                "mlp output layer has {fan_in} units, expected 1"
            )));
        }

        Ok(Self {
            input_dim,
            activation: spec.activation,
            layers,
        })
    }
}

impl Regressor for MlpModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, input: &Tensor) -> ServingResult<Tensor> {
        let (output, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| ServingError::internal("mlp has no layers"))?;
        let mut x = input.clone();
        for layer in hidden {
            x = self
                .activation
                .apply(layer.forward(&x)?)
                .map_err(|e| ServingError::prediction(format!("activation failed: {e}")))?;
        }
        output.forward(&x)
    }
}

#[derive(Debug)]
struct ForestModel {
    input_dim: usize,
    trees: Vec<TreeSpec>,
}

impl ForestModel {
    fn from_spec(spec: &ForestSpec) -> ServingResult<Self> {
        if spec.trees.is_empty() {
            return Err(ServingError::artifact_load("forest has no trees"));
        }
        for (t, tree) in spec.trees.iter().enumerate() {
            validate_tree(tree, spec.input_dim)
                .map_err(|msg| ServingError::artifact_load(format!("tree {t}: {msg}")))?;
        }
        Ok(Self {
            input_dim: spec.input_dim,
            trees: spec.trees.clone(),
        })
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| walk_tree(tree, row)).sum();
        total / self.trees.len() as f64
    }
}

fn validate_tree(tree: &TreeSpec, input_dim: usize) -> Result<(), String> {
    let n = tree.children_left.len();
    if n == 0 {
        return Err("tree has no nodes".to_string());
    }
    if [
        tree.children_right.len(),
        tree.feature.len(),
        tree.threshold.len(),
        tree.value.len(),
    ]
    .iter()
    .any(|&len| len != n)
    {
        return Err("node arrays have different lengths".to_string());
    }
    for node in 0..n {
        let (left, right) = (tree.children_left[node], tree.children_right[node]);
        if left == -1 {
            continue;
        }
        // Children always come after their parent, which also rules out cycles.
        for child in [left, right] {
            if child <= node as i64 || child >= n as i64 {
                return Err(format!("node {node} has invalid child {child}"));
            }
        }
        let feature = tree.feature[node];
        if feature < 0 || feature as usize >= input_dim {
            return Err(format!("node {node} splits on unknown feature {feature}"));
        }
    }
    Ok(())
}

fn walk_tree(tree: &TreeSpec, row: &[f64]) -> f64 {
    let mut node = 0usize;
    while tree.children_left[node] != -1 {
        node = if row[tree.feature[node] as usize] <= tree.threshold[node] {
            tree.children_left[node] as usize
        } else {
            tree.children_right[node] as usize
        };
    }
    tree.value[node]
}

impl Regressor for ForestModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, input: &Tensor) -> ServingResult<Tensor> {
        let rows = input.to_dtype(DType::F64)?.to_vec2::<f64>()?;
        let out: Vec<f64> = rows
            .iter()
            .map(|row| {
                if row.len() != self.input_dim {
                    return Err(ServingError::prediction(format!(
                        "forest expects {} inputs, got {}",
                        self.input_dim,
                        row.len()
                    )));
                }
                Ok(self.predict_row(row))
            })
            .collect::<ServingResult<_>>()?;
        Ok(Tensor::from_vec(out, (rows.len(), 1), input.device())?)
    }
}
