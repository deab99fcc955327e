//! Core Types and Trait Definitions for exo-predict
//!
//! Defines the uniform contract shared by every pipeline tier:
//! - **Transform:** a pre-fitted artifact evaluated one sample at a time
//! - **Tensor / Shape:** batched numeric data with an explicit per-sample shape
//! - **PipelineError:** the failure taxonomy every pipeline reports through
//!
//! # Architecture
//! Request → feature derivation → stages (transform per artifact) → output mapping.
//! Tensors always carry the batch as their leading dimension; requests use a
//! batch of one.

use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::artifacts::ArtifactError;

// ============================================================================
// Common Types
// ============================================================================

/// The four prediction pipelines served by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    PlanetType,
    Radiation,
    Gas,
    Habitability,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::PlanetType,
        PipelineKind::Radiation,
        PipelineKind::Gas,
        PipelineKind::Habitability,
    ];

    /// Stable name, also the artifact sub-directory
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::PlanetType => "planet_type",
            PipelineKind::Radiation => "radiation",
            PipelineKind::Gas => "gas",
            PipelineKind::Habitability => "habitability",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-sample shape (batch dimension excluded)
///
/// `[3]` is a three-feature row, `[100, 1]` is a 100-step single-channel sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    pub fn vector(len: usize) -> Self {
        Shape(vec![len])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of scalars in one sample
    pub fn volume(&self) -> usize {
        self.0.iter().product()
    }

    /// Length of a rank-1 shape
    pub fn as_vector(&self) -> Option<usize> {
        match self.0.as_slice() {
            [len] => Some(*len),
            _ => None,
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, "]")
    }
}

/// Batched `f64` tensor on the CPU device, batch first
///
/// Thin wrapper over [`candle_core::Tensor`] that pins the batch axis and the
/// dtype. Every tensor has rank two or more: the batch plus at least one
/// sample axis.
#[derive(Debug, Clone)]
pub struct Tensor(candle_core::Tensor);

impl Tensor {
    /// Build a tensor, checking that the data fills the shape exactly
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, PipelineError> {
        if shape.len() < 2 {
            return Err(PipelineError::Unexpected(format!(
                "tensor shape {:?} has no sample axis",
                shape
            )));
        }
        let inner = candle_core::Tensor::from_vec(data, shape, &Device::Cpu)?;
        Ok(Self(inner))
    }

    /// Single-row tabular tensor: `(1, n)`
    pub fn row(values: Vec<f64>) -> Result<Self, PipelineError> {
        let len = values.len();
        Self::new(vec![1, len], values)
    }

    /// Single-channel sequence tensor: `(1, n, 1)`
    pub fn sequence(values: Vec<f64>) -> Result<Self, PipelineError> {
        let len = values.len();
        Self::new(vec![1, len, 1], values)
    }

    pub fn shape(&self) -> &[usize] {
        self.0.dims()
    }

    pub fn batch(&self) -> usize {
        self.shape()[0]
    }

    pub fn sample_shape(&self) -> Shape {
        Shape::from(&self.shape()[1..])
    }

    /// Every value, row-major
    pub fn to_vec(&self) -> Result<Vec<f64>, PipelineError> {
        Ok(self.0.flatten_all()?.to_vec1::<f64>()?)
    }

    /// One flattened row per sample along the batch axis
    pub fn samples(&self) -> Result<Vec<Vec<f64>>, PipelineError> {
        Ok(self.0.flatten_from(1)?.to_vec2::<f64>()?)
    }

    /// Stack per-sample outputs back into a batched tensor
    pub fn from_samples(sample_shape: &Shape, samples: Vec<Vec<f64>>) -> Result<Self, PipelineError> {
        let mut shape = Vec::with_capacity(sample_shape.rank() + 1);
        shape.push(samples.len());
        shape.extend_from_slice(sample_shape.dims());
        Tensor::new(shape, samples.into_iter().flatten().collect())
    }

    /// Concatenate two batches of rank-1 samples along the feature axis
    ///
    /// Sample `i` of the result is `left[i]` followed by `right[i]`.
    pub fn concat_features(left: &Tensor, right: &Tensor) -> Result<Self, PipelineError> {
        if left.sample_shape().as_vector().is_none() || right.sample_shape().as_vector().is_none() {
            return Err(PipelineError::Unexpected(format!(
                "cannot concatenate non-vector samples {} and {}",
                left.sample_shape(),
                right.sample_shape()
            )));
        }
        if left.batch() != right.batch() {
            return Err(PipelineError::Unexpected(format!(
                "cannot concatenate batches of {} and {} samples",
                left.batch(),
                right.batch()
            )));
        }
        Ok(Self(candle_core::Tensor::cat(&[&left.0, &right.0], 1)?))
    }
}

// ============================================================================
// Transform Trait
// ============================================================================

/// Uniform contract of a pre-fitted artifact
///
/// Every scaler, reducer, imputer, classifier, regressor and network exposes
/// the same three things: the per-sample shape it accepts, the per-sample shape
/// it produces, and a pure function between them. Implementations never mutate
/// themselves, so one instance serves any number of concurrent callers.
///
/// Classifiers emit a single value: the winning class index as `f64`.
pub trait Transform: Send + Sync {
    /// Artifact kind for diagnostics ("standard_scaler", "sequential", ...)
    fn kind(&self) -> &'static str;

    /// Declared per-sample input shape
    fn input_shape(&self) -> Shape;

    /// Declared per-sample output shape
    fn output_shape(&self) -> Shape;

    /// Evaluate one sample
    ///
    /// `sample` holds exactly `input_shape().volume()` values (row-major);
    /// the result must hold exactly `output_shape().volume()` values.
    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Pipeline failure taxonomy
///
/// `InvalidInput` and `ShapeMismatch` are always raised before the affected
/// artifact is touched. Unmapped class indices are not errors: they degrade to
/// an explicit `Unknown` label.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Request precondition violated (client error, never retried)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input does not match a stage's declared shape
    #[error("Shape mismatch at {stage}: expected {expected}, got {actual}")]
    ShapeMismatch {
        stage: String,
        expected: Shape,
        actual: Shape,
    },

    /// A required artifact failed to load or the pipeline could not be assembled
    #[error("Pipeline '{pipeline}' unavailable: {reason}")]
    ArtifactUnavailable { pipeline: PipelineKind, reason: String },

    /// Any other failure during stage execution
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<candle_core::Error> for PipelineError {
    fn from(err: candle_core::Error) -> Self {
        PipelineError::Unexpected(format!("tensor operation failed: {}", err))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape(vec![100, 1]).to_string(), "[100, 1]");
        assert_eq!(Shape::vector(3).to_string(), "[3]");
    }

    #[test]
    fn test_sequence_tensor_shape() {
        let tensor = Tensor::sequence(vec![0.0; 100]).unwrap();
        assert_eq!(tensor.shape(), &[1, 100, 1]);
        assert_eq!(tensor.sample_shape(), Shape(vec![100, 1]));
    }

    #[test]
    fn test_tensor_new_rejects_wrong_volume() {
        assert!(Tensor::new(vec![1, 3], vec![1.0, 2.0]).is_err());
        assert!(Tensor::new(vec![3], vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_concat_features_keeps_order() {
        let left = Tensor::new(vec![2, 2], vec![1.0, 2.0, 5.0, 6.0]).unwrap();
        let right = Tensor::new(vec![2, 1], vec![3.0, 7.0]).unwrap();
        let merged = Tensor::concat_features(&left, &right).unwrap();
        assert_eq!(merged.shape(), &[2, 3]);
        assert_eq!(merged.samples().unwrap(), vec![vec![1.0, 2.0, 3.0], vec![5.0, 6.0, 7.0]]);
    }

    #[test]
    fn test_concat_features_rejects_sequences() {
        let left = Tensor::sequence(vec![1.0, 2.0]).unwrap();
        let right = Tensor::row(vec![3.0]).unwrap();
        assert!(Tensor::concat_features(&left, &right).is_err());
    }

    #[test]
    fn test_pipeline_kind_names() {
        let names: Vec<_> = PipelineKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["planet_type", "radiation", "gas", "habitability"]);
    }
}
