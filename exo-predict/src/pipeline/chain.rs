//! Ordered stage composition

use tracing::debug;

use super::stage::Stage;
use crate::types::{PipelineError, PipelineKind, Shape, Tensor};

/// Non-empty sequence of stages whose shapes line up end to end
///
/// Adjacent stages are checked when the chain is built, so a chain that exists
/// can only fail at run time on its first stage's input or inside an artifact.
#[derive(Debug, Clone)]
pub struct StageChain {
    stages: Vec<Stage>,
}

impl StageChain {
    /// Assemble a chain for `pipeline`
    ///
    /// # Errors
    /// `ArtifactUnavailable` if the chain is empty or a stage's output shape
    /// differs from the next stage's input shape.
    pub fn new(pipeline: PipelineKind, stages: Vec<Stage>) -> Result<Self, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::ArtifactUnavailable {
                pipeline,
                reason: "pipeline has no stages".to_string(),
            });
        }

        for pair in stages.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if from.output_shape() != to.input_shape() {
                return Err(PipelineError::ArtifactUnavailable {
                    pipeline,
                    reason: format!(
                        "stage '{}' produces {} but stage '{}' expects {}",
                        from.name(),
                        from.output_shape(),
                        to.name(),
                        to.input_shape()
                    ),
                });
            }
        }

        debug!(
            pipeline = %pipeline,
            stages = ?stages.iter().map(Stage::name).collect::<Vec<_>>(),
            "Stage chain assembled"
        );
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn input_shape(&self) -> Shape {
        self.stages[0].input_shape()
    }

    pub fn output_shape(&self) -> Shape {
        self.stages[self.stages.len() - 1].output_shape()
    }

    /// Feed `input` through every stage in order
    pub fn run(&self, input: &Tensor) -> Result<Tensor, PipelineError> {
        let (first, rest) = self
            .stages
            .split_first()
            .ok_or_else(|| PipelineError::Unexpected("empty stage chain".to_string()))?;

        let mut current = first.apply(input)?;
        for stage in rest {
            current = stage.apply(&current)?;
        }
        Ok(current)
    }
}
