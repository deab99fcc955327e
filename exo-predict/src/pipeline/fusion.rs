//! Fusion Pipeline (gas composition)
//!
//! Two independent encode branches feed one merge:
//!
//! ```text
//! spectrum (1, L, 1) ── spectral_encode ──────────────── A ─┐
//!                                                           concat(A, B) → fusion → decode → 12 fractions
//! features (1, n) ───── tabular_scale → tabular_encode ─ B ─┘
//! ```
//!
//! Branch results are joined before the merge. The merge always places the
//! spectral embedding first, so the branch schedule never changes the output.

use exo_common::config::BranchSchedule;
use tracing::debug;

use super::{Stage, StageChain};
use crate::features::{FeatureVector, SpectrumSample};
use crate::output::{GasComposition, GasSpecies};
use crate::registry::{ids, ArtifactRegistry};
use crate::types::{PipelineError, PipelineKind, Shape, Tensor};

const PIPELINE: PipelineKind = PipelineKind::Gas;

fn unavailable(reason: String) -> PipelineError {
    PipelineError::ArtifactUnavailable {
        pipeline: PIPELINE,
        reason,
    }
}

/// Two-branch gas-composition graph
#[derive(Debug, Clone)]
pub struct FusionPipeline {
    spectral: Stage,
    tabular: StageChain,
    fusion: Stage,
    decoder: Stage,
    schedule: BranchSchedule,
}

impl FusionPipeline {
    /// Wire the graph from its stages, checking every junction
    ///
    /// # Errors
    /// `ArtifactUnavailable` when:
    /// - the spectral encoder does not take a single-channel sequence `[L, 1]`
    /// - either branch does not produce a rank-1 embedding
    /// - the fusion input width is not the sum of both embedding widths
    /// - the decoder does not produce one value per gas species
    pub fn new(
        spectral: Stage,
        tabular: Vec<Stage>,
        fusion: Stage,
        decoder: Stage,
        schedule: BranchSchedule,
    ) -> Result<Self, PipelineError> {
        let tabular = StageChain::new(PIPELINE, tabular)?;

        let spectral_input = spectral.input_shape();
        if !matches!(spectral_input.dims(), [length, 1] if *length > 0) {
            return Err(unavailable(format!(
                "spectral encoder expects {}, not a single-channel sequence",
                spectral_input
            )));
        }

        let Some(spectral_width) = spectral.output_shape().as_vector() else {
            return Err(unavailable(format!(
                "spectral encoder produces {}, not an embedding",
                spectral.output_shape()
            )));
        };
        let Some(tabular_width) = tabular.output_shape().as_vector() else {
            return Err(unavailable(format!(
                "tabular encoder produces {}, not an embedding",
                tabular.output_shape()
            )));
        };

        let merged = Shape::vector(spectral_width + tabular_width);
        if fusion.input_shape() != merged {
            return Err(unavailable(format!(
                "fusion expects {} but the merged embeddings are {}",
                fusion.input_shape(),
                merged
            )));
        }
        if fusion.output_shape() != decoder.input_shape() {
            return Err(unavailable(format!(
                "fusion produces {} but the decoder expects {}",
                fusion.output_shape(),
                decoder.input_shape()
            )));
        }
        let species = Shape::vector(GasSpecies::ALL.len());
        if decoder.output_shape() != species {
            return Err(unavailable(format!(
                "decoder produces {}, expected {}",
                decoder.output_shape(),
                species
            )));
        }

        debug!(
            spectral = %spectral_input,
            tabular = %tabular.input_shape(),
            merged = %merged,
            schedule = %schedule,
            "Fusion pipeline assembled"
        );
        Ok(Self {
            spectral,
            tabular,
            fusion,
            decoder,
            schedule,
        })
    }

    /// Assemble the gas graph from registry artifacts
    pub fn from_registry(registry: &ArtifactRegistry, schedule: BranchSchedule) -> Result<Self, PipelineError> {
        Self::new(
            Stage::new("spectral_encode", registry.get(ids::GAS_SPECTRAL_ENCODER)?),
            vec![
                Stage::new("tabular_scale", registry.get(ids::GAS_TABULAR_SCALER)?),
                Stage::new("tabular_encode", registry.get(ids::GAS_TABULAR_ENCODER)?),
            ],
            Stage::new("fusion", registry.get(ids::GAS_FUSION)?),
            Stage::new("decode", registry.get(ids::GAS_DECODER)?),
            schedule,
        )
    }

    pub fn schedule(&self) -> BranchSchedule {
        self.schedule
    }

    /// Same graph, different branch schedule
    pub fn with_schedule(mut self, schedule: BranchSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Declared spectrum length
    pub fn spectrum_length(&self) -> usize {
        self.spectral.input_shape().dims()[0]
    }

    /// Declared planetary-feature width
    pub fn feature_width(&self) -> usize {
        self.tabular.input_shape().volume()
    }

    /// Reject inputs whose shape differs from the branch entry points
    fn check_inputs(&self, spectrum: &SpectrumSample, features: &FeatureVector) -> Result<(), PipelineError> {
        let expected = self.spectral.input_shape();
        let actual = Shape(vec![spectrum.len(), 1]);
        if actual != expected {
            return Err(PipelineError::ShapeMismatch {
                stage: self.spectral.name().to_string(),
                expected,
                actual,
            });
        }

        let expected = self.tabular.input_shape();
        let actual = Shape::vector(features.len());
        if actual != expected {
            return Err(PipelineError::ShapeMismatch {
                stage: self.tabular.stages()[0].name().to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Encode both branches according to the schedule
    async fn encode(&self, spectrum: Tensor, features: Tensor) -> Result<(Tensor, Tensor), PipelineError> {
        match self.schedule {
            BranchSchedule::Concurrent => {
                let spectral = self.spectral.clone();
                let tabular = self.tabular.clone();
                let spectral_task = tokio::task::spawn_blocking(move || spectral.apply(&spectrum));
                let tabular_task = tokio::task::spawn_blocking(move || tabular.run(&features));

                let (a, b) = tokio::join!(spectral_task, tabular_task);
                let a = a.map_err(|e| PipelineError::Unexpected(format!("spectral branch panicked: {}", e)))??;
                let b = b.map_err(|e| PipelineError::Unexpected(format!("tabular branch panicked: {}", e)))??;
                Ok((a, b))
            }
            BranchSchedule::SpectralFirst => {
                let a = self.spectral.apply(&spectrum)?;
                let b = self.tabular.run(&features)?;
                Ok((a, b))
            }
            BranchSchedule::TabularFirst => {
                let b = self.tabular.run(&features)?;
                let a = self.spectral.apply(&spectrum)?;
                Ok((a, b))
            }
        }
    }

    /// Estimate gas composition for one spectrum and its planetary features
    ///
    /// # Errors
    /// - `ShapeMismatch` if the spectrum length or feature width differs from the
    ///   declared branch inputs; no artifact is invoked
    /// - `Unexpected` for any failure inside a stage
    pub async fn run(
        &self,
        spectrum: &SpectrumSample,
        features: &FeatureVector,
    ) -> Result<GasComposition, PipelineError> {
        self.check_inputs(spectrum, features)?;

        let (a, b) = self.encode(spectrum.to_tensor()?, features.to_tensor()?).await?;
        debug!(
            spectral_embedding = %a.sample_shape(),
            tabular_embedding = %b.sample_shape(),
            schedule = %self.schedule,
            "Branches encoded"
        );

        let merged = Tensor::concat_features(&a, &b)?;
        let latent = self.fusion.apply(&merged)?;
        let decoded = self.decoder.apply(&latent)?;

        GasComposition::from_values(&decoded.to_vec()?)
    }
}
