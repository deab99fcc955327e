//! Prediction Service
//!
//! Owns the four pipelines assembled from the registry and exposes one
//! operation per pipeline: request → feature derivation → pipeline → output
//! mapping. Each call runs inside a `predict` span carrying the pipeline name
//! and a fresh request id.
//!
//! A pipeline that could not be assembled keeps its construction error; every
//! call to it returns that error. Request validation always runs first, so a
//! malformed request is reported as such even when its pipeline is down.

use exo_common::config::BranchSchedule;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::features::{GasRequest, HabitabilityRequest, PlanetTypeRequest, RadiationRequest};
use crate::output::{
    ClassIndex, GasPrediction, HabitabilityScores, PlanetType, PlanetTypePrediction,
    RadiationLevel, RadiationPrediction,
};
use crate::pipeline::{FusionPipeline, Pipeline};
use crate::registry::ArtifactRegistry;
use crate::types::{PipelineError, PipelineKind};

/// Availability of one pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub pipeline: PipelineKind,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Façade over every prediction pipeline
pub struct PredictionService {
    planet_type: Result<Pipeline, PipelineError>,
    radiation: Result<Pipeline, PipelineError>,
    gas: Result<FusionPipeline, PipelineError>,
    habitability: Result<Pipeline, PipelineError>,
}

impl PredictionService {
    /// Assemble every pipeline from the registry
    ///
    /// Never fails as a whole; unavailable pipelines are logged and remembered.
    pub fn new(registry: &ArtifactRegistry, schedule: BranchSchedule) -> Self {
        let service = Self::from_parts(
            Pipeline::from_registry(PipelineKind::PlanetType, registry),
            Pipeline::from_registry(PipelineKind::Radiation, registry),
            FusionPipeline::from_registry(registry, schedule),
            Pipeline::from_registry(PipelineKind::Habitability, registry),
        );

        for status in service.status() {
            match &status.reason {
                None => info!(pipeline = %status.pipeline, "Pipeline ready"),
                Some(reason) => warn!(pipeline = %status.pipeline, reason = %reason, "Pipeline unavailable"),
            }
        }
        service
    }

    /// Build from already-assembled pipelines
    pub fn from_parts(
        planet_type: Result<Pipeline, PipelineError>,
        radiation: Result<Pipeline, PipelineError>,
        gas: Result<FusionPipeline, PipelineError>,
        habitability: Result<Pipeline, PipelineError>,
    ) -> Self {
        Self {
            planet_type,
            radiation,
            gas,
            habitability,
        }
    }

    /// Availability of every pipeline, in a fixed order
    pub fn status(&self) -> Vec<PipelineStatus> {
        let describe = |result: Result<(), &PipelineError>| result.err().map(|e| e.to_string());
        PipelineKind::ALL
            .iter()
            .map(|kind| {
                let reason = match kind {
                    PipelineKind::PlanetType => describe(self.planet_type.as_ref().map(|_| ())),
                    PipelineKind::Radiation => describe(self.radiation.as_ref().map(|_| ())),
                    PipelineKind::Gas => describe(self.gas.as_ref().map(|_| ())),
                    PipelineKind::Habitability => describe(self.habitability.as_ref().map(|_| ())),
                };
                PipelineStatus {
                    pipeline: *kind,
                    available: reason.is_none(),
                    reason,
                }
            })
            .collect()
    }

    pub fn is_available(&self, kind: PipelineKind) -> bool {
        match kind {
            PipelineKind::PlanetType => self.planet_type.is_ok(),
            PipelineKind::Radiation => self.radiation.is_ok(),
            PipelineKind::Gas => self.gas.is_ok(),
            PipelineKind::Habitability => self.habitability.is_ok(),
        }
    }

    /// Classify planet type from mass and radius
    pub fn predict_planet_type(&self, request: &PlanetTypeRequest) -> Result<PlanetTypePrediction, PipelineError> {
        let span = info_span!("predict", pipeline = %PipelineKind::PlanetType, request_id = %Uuid::new_v4());
        let _enter = span.enter();

        let features = request.features().inspect_err(log_failure)?;
        let pipeline = self.planet_type.as_ref().map_err(Clone::clone).inspect_err(log_failure)?;
        let output = pipeline.run(&features).inspect_err(log_failure)?;
        let prediction = PlanetType::from_index(ClassIndex::from_output(&output)?);

        info!(prediction = %prediction, "Prediction complete");
        Ok(PlanetTypePrediction {
            prediction,
            pl_mass: request.pl_mass,
            pl_radius: request.pl_radius,
        })
    }

    /// Classify stellar radiation level
    pub fn predict_radiation(&self, request: &RadiationRequest) -> Result<RadiationPrediction, PipelineError> {
        let span = info_span!("predict", pipeline = %PipelineKind::Radiation, request_id = %Uuid::new_v4());
        let _enter = span.enter();

        let features = request.features().inspect_err(log_failure)?;
        let pipeline = self.radiation.as_ref().map_err(Clone::clone).inspect_err(log_failure)?;
        let output = pipeline.run(&features).inspect_err(log_failure)?;
        let prediction = RadiationLevel::from_index(ClassIndex::from_output(&output)?);

        info!(prediction = %prediction, "Prediction complete");
        Ok(RadiationPrediction { prediction })
    }

    /// Estimate atmospheric gas composition from a spectrum and planetary features
    pub async fn predict_gas(&self, request: &GasRequest) -> Result<GasPrediction, PipelineError> {
        let span = info_span!("predict", pipeline = %PipelineKind::Gas, request_id = %Uuid::new_v4());

        async {
            let (spectrum, features) = request.features().inspect_err(log_failure)?;
            let pipeline = self.gas.as_ref().map_err(Clone::clone).inspect_err(log_failure)?;
            let predicted_gases = pipeline
                .run(&spectrum, &features)
                .await
                .inspect_err(log_failure)?;

            info!(schedule = %pipeline.schedule(), "Prediction complete");
            Ok(GasPrediction { predicted_gases })
        }
        .instrument(span)
        .await
    }

    /// Score habitability; missing fields are imputed
    pub fn predict_habitability(&self, request: &HabitabilityRequest) -> Result<HabitabilityScores, PipelineError> {
        let span = info_span!("predict", pipeline = %PipelineKind::Habitability, request_id = %Uuid::new_v4());
        let _enter = span.enter();

        let features = request.features().inspect_err(log_failure)?;
        let pipeline = self.habitability.as_ref().map_err(Clone::clone).inspect_err(log_failure)?;
        let output = pipeline.run(&features).inspect_err(log_failure)?;
        let scores = HabitabilityScores::from_values(&output).inspect_err(log_failure)?;

        info!(p_esi = scores.P_ESI, "Prediction complete");
        Ok(scores)
    }
}

fn log_failure(error: &PipelineError) {
    match error {
        PipelineError::InvalidInput(_) | PipelineError::ShapeMismatch { .. } => {
            info!(error = %error, "Request rejected")
        }
        PipelineError::ArtifactUnavailable { .. } => warn!(error = %error, "Pipeline unavailable"),
        PipelineError::Unexpected(_) => tracing::error!(error = %error, "Prediction failed"),
    }
}
