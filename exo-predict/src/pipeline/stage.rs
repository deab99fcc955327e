//! Stage: one named artifact with a checked input contract

use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::types::{PipelineError, Shape, Tensor, Transform};

/// A single pipeline step wrapping one artifact
///
/// The artifact is shared (`Arc`) with the registry and every other pipeline
/// that uses it. A stage never mutates its artifact.
#[derive(Clone)]
pub struct Stage {
    name: String,
    transform: Arc<dyn Transform>,
}

impl Stage {
    pub fn new(name: impl Into<String>, transform: Arc<dyn Transform>) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.transform.kind()
    }

    pub fn input_shape(&self) -> Shape {
        self.transform.input_shape()
    }

    pub fn output_shape(&self) -> Shape {
        self.transform.output_shape()
    }

    /// Apply the artifact to every sample of the batch
    ///
    /// # Errors
    /// - `ShapeMismatch` if the per-sample shape differs from the declared input;
    ///   the artifact is not invoked
    /// - `Unexpected` if the artifact itself fails or breaks its output contract
    pub fn apply(&self, input: &Tensor) -> Result<Tensor, PipelineError> {
        let expected = self.input_shape();
        let actual = input.sample_shape();
        if actual != expected {
            return Err(PipelineError::ShapeMismatch {
                stage: self.name.clone(),
                expected,
                actual,
            });
        }

        let output_shape = self.output_shape();
        let output_len = output_shape.volume();

        let mut outputs = Vec::with_capacity(input.batch());
        for sample in input.samples()? {
            let output = self.transform.transform(&sample).map_err(|e| {
                PipelineError::Unexpected(format!("stage '{}' failed: {}", self.name, e))
            })?;
            if output.len() != output_len {
                return Err(PipelineError::Unexpected(format!(
                    "stage '{}' produced {} values, declared output {}",
                    self.name,
                    output.len(),
                    output_shape
                )));
            }
            outputs.push(output);
        }

        trace!(stage = %self.name, input = %actual, output = %output_shape, "Stage applied");
        Tensor::from_samples(&output_shape, outputs)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("input", &self.input_shape())
            .field("output", &self.output_shape())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Doubles its input and counts invocations
    struct Doubler {
        width: usize,
        calls: AtomicUsize,
    }

    impl Transform for Doubler {
        fn kind(&self) -> &'static str {
            "doubler"
        }

        fn input_shape(&self) -> Shape {
            Shape::vector(self.width)
        }

        fn output_shape(&self) -> Shape {
            Shape::vector(self.width)
        }

        fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(sample.iter().map(|x| x * 2.0).collect())
        }
    }

    /// Declares one output value but returns two
    struct Liar;

    impl Transform for Liar {
        fn kind(&self) -> &'static str {
            "liar"
        }

        fn input_shape(&self) -> Shape {
            Shape::vector(1)
        }

        fn output_shape(&self) -> Shape {
            Shape::vector(1)
        }

        fn transform(&self, _sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
            Ok(vec![0.0, 0.0])
        }
    }

    #[test]
    fn test_apply_transforms_each_sample() {
        let doubler = Arc::new(Doubler {
            width: 2,
            calls: AtomicUsize::new(0),
        });
        let stage = Stage::new("double", doubler.clone());
        let input = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let output = stage.apply(&input).unwrap();
        assert_eq!(output.shape(), &[2, 2]);
        assert_eq!(output.to_vec().unwrap(), vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(doubler.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shape_mismatch_does_not_invoke_artifact() {
        let doubler = Arc::new(Doubler {
            width: 3,
            calls: AtomicUsize::new(0),
        });
        let stage = Stage::new("double", doubler.clone());

        let err = stage.apply(&Tensor::row(vec![1.0, 2.0]).unwrap()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ShapeMismatch {
                stage: "double".to_string(),
                expected: Shape::vector(3),
                actual: Shape::vector(2),
            }
        );
        assert_eq!(doubler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_broken_output_contract_is_unexpected() {
        let stage = Stage::new("liar", Arc::new(Liar));
        let err = stage.apply(&Tensor::row(vec![1.0]).unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::Unexpected(_)));
    }
}
