//! Pipeline Orchestration
//!
//! Single-branch pipelines compose registry artifacts into a fixed stage order:
//! - **planet_type:** scale → classify
//! - **radiation:** scale → reduce dimensionality → classify
//! - **habitability:** impute missing → scale → multi-output regress
//!
//! The gas-composition graph lives in [`fusion`].
//!
//! # Error Handling
//! - A missing artifact or misaligned stage pair makes the pipeline unavailable
//!   when it is assembled; every request to it then reports `ArtifactUnavailable`
//! - Input width is checked against the first stage before any artifact runs
//! - Failures inside an artifact surface as `Unexpected`

pub mod chain;
pub mod fusion;
pub mod stage;

pub use chain::StageChain;
pub use fusion::FusionPipeline;
pub use stage::Stage;

use tracing::debug;

use crate::features::FeatureVector;
use crate::registry::{ids, ArtifactId, ArtifactRegistry};
use crate::types::{PipelineError, PipelineKind, Shape};

/// Stage names and artifacts for a single-branch pipeline, in execution order
fn layout(kind: PipelineKind) -> Result<&'static [(&'static str, ArtifactId)], PipelineError> {
    const PLANET_TYPE: &[(&str, ArtifactId)] = &[
        ("scale", ids::PLANET_TYPE_SCALER),
        ("classify", ids::PLANET_TYPE_CLASSIFIER),
    ];
    const RADIATION: &[(&str, ArtifactId)] = &[
        ("scale", ids::RADIATION_SCALER),
        ("reduce", ids::RADIATION_PCA),
        ("classify", ids::RADIATION_CLASSIFIER),
    ];
    const HABITABILITY: &[(&str, ArtifactId)] = &[
        ("impute", ids::HABITABILITY_IMPUTER),
        ("scale", ids::HABITABILITY_SCALER),
        ("regress", ids::HABITABILITY_REGRESSOR),
    ];

    match kind {
        PipelineKind::PlanetType => Ok(PLANET_TYPE),
        PipelineKind::Radiation => Ok(RADIATION),
        PipelineKind::Habitability => Ok(HABITABILITY),
        PipelineKind::Gas => Err(PipelineError::Unexpected(
            "gas composition runs through the fusion pipeline".to_string(),
        )),
    }
}

/// Ordered single-branch pipeline
///
/// Stage `i` output is stage `i + 1` input. No stage is skipped or reordered.
#[derive(Debug, Clone)]
pub struct Pipeline {
    kind: PipelineKind,
    chain: StageChain,
}

impl Pipeline {
    /// Compose explicit stages
    pub fn new(kind: PipelineKind, stages: Vec<Stage>) -> Result<Self, PipelineError> {
        Ok(Self {
            kind,
            chain: StageChain::new(kind, stages)?,
        })
    }

    /// Assemble the standard stage layout for `kind` from registry artifacts
    ///
    /// # Errors
    /// `ArtifactUnavailable` if any required artifact failed to load or the
    /// stages do not line up.
    pub fn from_registry(kind: PipelineKind, registry: &ArtifactRegistry) -> Result<Self, PipelineError> {
        let stages = layout(kind)?
            .iter()
            .map(|(name, id)| {
                let artifact = registry.get(*id)?;
                Ok(Stage::new(*name, artifact))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        Self::new(kind, stages)
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn stages(&self) -> &[Stage] {
        self.chain.stages()
    }

    pub fn input_shape(&self) -> Shape {
        self.chain.input_shape()
    }

    pub fn output_shape(&self) -> Shape {
        self.chain.output_shape()
    }

    /// Run one feature row through every stage
    ///
    /// Returns the final stage's output for the single sample.
    pub fn run(&self, features: &FeatureVector) -> Result<Vec<f64>, PipelineError> {
        let expected = self.input_shape();
        let actual = Shape::vector(features.len());
        if actual != expected {
            return Err(PipelineError::ShapeMismatch {
                stage: self.chain.stages()[0].name().to_string(),
                expected,
                actual,
            });
        }

        let output = self.chain.run(&features.to_tensor()?)?.to_vec()?;
        debug!(pipeline = %self.kind, output = ?output, "Pipeline complete");
        Ok(output)
    }
}
