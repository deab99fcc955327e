//! Pre-fitted artifacts
//!
//! Concrete, serializable forms of the read-only numeric objects the pipelines
//! are built from. Each artifact is a JSON document tagged by `kind`:
//!
//! ```json
//! { "kind": "standard_scaler", "mean": [0.0, 1.0], "scale": [1.0, 2.0] }
//! ```
//!
//! Loading validates internal consistency (matching dimensions, reachable tree
//! nodes, layer shapes) so a malformed artifact fails at startup instead of on
//! the first request that touches it.

pub mod forest;
pub mod linear;
pub mod network;
pub mod preprocessing;

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::{Shape, Transform};

pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use linear::{LinearClassifier, LinearRegressor};
pub use network::{Activation, Layer, Padding, Sequential, SequentialSpec};
pub use preprocessing::{Pca, SimpleImputer, StandardScaler};

/// Artifact loading or evaluation error
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// I/O error reading the artifact file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact file is not valid JSON for any known kind
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Artifact parsed but its parameters are inconsistent
    #[error("Invalid artifact: {0}")]
    Invalid(String),

    /// Sample length differs from the declared input volume
    #[error("Dimension mismatch: expected {expected} values, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// Tensor operation failed during evaluation
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

/// Any pre-fitted artifact the registry can hold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    StandardScaler(StandardScaler),
    Pca(Pca),
    SimpleImputer(SimpleImputer),
    LinearClassifier(LinearClassifier),
    ForestClassifier(ForestClassifier),
    LinearRegressor(LinearRegressor),
    Sequential(Sequential),
}

impl Artifact {
    /// Read, parse and validate an artifact file
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate an artifact document
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: Artifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Serialize to the on-disk JSON form
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check internal consistency of the fitted parameters
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Artifact::StandardScaler(a) => a.validate(),
            Artifact::Pca(a) => a.validate(),
            Artifact::SimpleImputer(a) => a.validate(),
            Artifact::LinearClassifier(a) => a.validate(),
            Artifact::ForestClassifier(a) => a.validate(),
            Artifact::LinearRegressor(a) => a.validate(),
            Artifact::Sequential(a) => a.validate(),
        }
    }

    fn inner(&self) -> &dyn Transform {
        match self {
            Artifact::StandardScaler(a) => a,
            Artifact::Pca(a) => a,
            Artifact::SimpleImputer(a) => a,
            Artifact::LinearClassifier(a) => a,
            Artifact::ForestClassifier(a) => a,
            Artifact::LinearRegressor(a) => a,
            Artifact::Sequential(a) => a,
        }
    }
}

impl Transform for Artifact {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn input_shape(&self) -> Shape {
        self.inner().input_shape()
    }

    fn output_shape(&self) -> Shape {
        self.inner().output_shape()
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        self.inner().transform(sample)
    }
}

/// Reject a sample whose length differs from the expected volume
pub(crate) fn check_len(sample: &[f64], expected: usize) -> Result<(), ArtifactError> {
    if sample.len() != expected {
        return Err(ArtifactError::Dimension {
            expected,
            actual: sample.len(),
        });
    }
    Ok(())
}

/// Reject a weight matrix whose rows are not all `width` long
pub(crate) fn check_matrix(name: &str, rows: &[Vec<f64>], width: usize) -> Result<(), ArtifactError> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(ArtifactError::Invalid(format!(
            "{} row {} has {} columns, expected {}",
            name,
            i,
            row.len(),
            width
        )));
    }
    Ok(())
}

/// One sample as a batch-of-one tensor with the given sample dims
pub(crate) fn sample_tensor(sample: &[f64], dims: &[usize]) -> Result<Tensor, ArtifactError> {
    let mut shape = Vec::with_capacity(dims.len() + 1);
    shape.push(1);
    shape.extend_from_slice(dims);
    Ok(Tensor::from_slice(sample, shape, &Device::Cpu)?)
}

/// Rank-1 parameter tensor
pub(crate) fn vector(values: &[f64]) -> Result<Tensor, ArtifactError> {
    Ok(Tensor::from_slice(values, values.len(), &Device::Cpu)?)
}

/// Row-major `(rows, cols)` parameter tensor; rows must already be rectangular
pub(crate) fn matrix(rows: &[Vec<f64>]) -> Result<Tensor, ArtifactError> {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    let data: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(Tensor::from_vec(data, (rows.len(), cols), &Device::Cpu)?)
}

/// `y = x @ Wᵀ + b` for `x: (batch, in)`, `W: (out, in)`, `b: (out)`
pub(crate) fn affine(x: &Tensor, weights: &Tensor, bias: &Tensor) -> Result<Tensor, ArtifactError> {
    let weights_t = weights.t()?;
    Ok(x.matmul(&weights_t)?.broadcast_add(bias)?)
}

/// Flatten an evaluated batch-of-one tensor back into sample values
pub(crate) fn into_values(tensor: &Tensor) -> Result<Vec<f64>, ArtifactError> {
    Ok(tensor.flatten_all()?.to_vec1::<f64>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json_round_trip() {
        let json = r#"{ "kind": "standard_scaler", "mean": [1.0, 2.0], "scale": [2.0, 4.0] }"#;
        let artifact = Artifact::from_json(json).unwrap();
        assert_eq!(artifact.kind(), "standard_scaler");
        assert_eq!(artifact.input_shape(), Shape::vector(2));

        let reparsed = Artifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.transform(&[3.0, 6.0]).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result = Artifact::from_json(r#"{ "kind": "gradient_boosting" }"#);
        assert!(matches!(result, Err(ArtifactError::Parse(_))));
    }

    #[test]
    fn test_inconsistent_parameters_rejected_on_load() {
        let json = r#"{ "kind": "standard_scaler", "mean": [1.0, 2.0], "scale": [2.0] }"#;
        assert!(matches!(Artifact::from_json(json), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Artifact::load(Path::new("/nonexistent/exo/scaler.json"));
        assert!(matches!(result, Err(ArtifactError::Io(_))));
    }
}
