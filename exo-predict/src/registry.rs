//! Artifact Registry
//!
//! Loads every artifact named in the manifest once at startup and holds it
//! read-only for the life of the process. Each entry records its own load
//! result: one broken file makes only the pipelines that depend on it
//! unavailable, never the whole service.
//!
//! # Layout
//! Artifacts live at `<models_dir>/<pipeline>/<name>.json`, for example
//! `models/radiation/pca.json`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifacts::Artifact;
use crate::types::{PipelineError, PipelineKind, Shape, Transform};

/// Stable artifact identifier: pipeline plus artifact name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
    pub pipeline: PipelineKind,
    pub name: &'static str,
}

impl ArtifactId {
    pub const fn new(pipeline: PipelineKind, name: &'static str) -> Self {
        Self { pipeline, name }
    }

    /// File location under the models directory
    pub fn path_in(&self, models_dir: &Path) -> PathBuf {
        models_dir
            .join(self.pipeline.as_str())
            .join(format!("{}.json", self.name))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pipeline, self.name)
    }
}

/// Manifest entries, grouped by pipeline in stage order
pub mod ids {
    use super::ArtifactId;
    use crate::types::PipelineKind::*;

    pub const PLANET_TYPE_SCALER: ArtifactId = ArtifactId::new(PlanetType, "scaler");
    pub const PLANET_TYPE_CLASSIFIER: ArtifactId = ArtifactId::new(PlanetType, "classifier");

    pub const RADIATION_SCALER: ArtifactId = ArtifactId::new(Radiation, "scaler");
    pub const RADIATION_PCA: ArtifactId = ArtifactId::new(Radiation, "pca");
    pub const RADIATION_CLASSIFIER: ArtifactId = ArtifactId::new(Radiation, "classifier");

    pub const GAS_SPECTRAL_ENCODER: ArtifactId = ArtifactId::new(Gas, "spectral_encoder");
    pub const GAS_TABULAR_SCALER: ArtifactId = ArtifactId::new(Gas, "tabular_scaler");
    pub const GAS_TABULAR_ENCODER: ArtifactId = ArtifactId::new(Gas, "tabular_encoder");
    pub const GAS_FUSION: ArtifactId = ArtifactId::new(Gas, "fusion");
    pub const GAS_DECODER: ArtifactId = ArtifactId::new(Gas, "decoder");

    pub const HABITABILITY_IMPUTER: ArtifactId = ArtifactId::new(Habitability, "imputer");
    pub const HABITABILITY_SCALER: ArtifactId = ArtifactId::new(Habitability, "scaler");
    pub const HABITABILITY_REGRESSOR: ArtifactId = ArtifactId::new(Habitability, "regressor");

    /// Every artifact the service loads at startup
    pub const MANIFEST: [ArtifactId; 13] = [
        PLANET_TYPE_SCALER,
        PLANET_TYPE_CLASSIFIER,
        RADIATION_SCALER,
        RADIATION_PCA,
        RADIATION_CLASSIFIER,
        GAS_SPECTRAL_ENCODER,
        GAS_TABULAR_SCALER,
        GAS_TABULAR_ENCODER,
        GAS_FUSION,
        GAS_DECODER,
        HABITABILITY_IMPUTER,
        HABITABILITY_SCALER,
        HABITABILITY_REGRESSOR,
    ];
}

/// Load status of one manifest entry
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub id: String,
    pub pipeline: PipelineKind,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only store of loaded artifacts
///
/// There is no mutation after construction; `Arc` handles are shared with
/// every pipeline and request.
pub struct ArtifactRegistry {
    source: Option<PathBuf>,
    entries: BTreeMap<ArtifactId, Result<Arc<Artifact>, String>>,
}

impl ArtifactRegistry {
    /// Load every manifest entry from `models_dir`
    ///
    /// Never fails as a whole: each entry keeps its own result.
    pub fn load(models_dir: &Path) -> Self {
        info!("Loading artifacts from {}", models_dir.display());

        let mut entries = BTreeMap::new();
        for id in ids::MANIFEST {
            let path = id.path_in(models_dir);
            let result = match Artifact::load(&path) {
                Ok(artifact) => {
                    debug!(
                        artifact = %id,
                        kind = artifact.kind(),
                        input = %artifact.input_shape(),
                        output = %artifact.output_shape(),
                        "Artifact loaded"
                    );
                    Ok(Arc::new(artifact))
                }
                Err(e) => {
                    warn!(artifact = %id, path = %path.display(), error = %e, "Artifact failed to load");
                    Err(format!("{}: {}", path.display(), e))
                }
            };
            entries.insert(id, result);
        }

        let registry = Self {
            source: Some(models_dir.to_path_buf()),
            entries,
        };
        info!(
            "Artifact registry ready: {} of {} loaded",
            registry.loaded_count(),
            ids::MANIFEST.len()
        );
        registry
    }

    /// Build a registry from in-memory artifacts
    ///
    /// Artifacts are validated exactly as on load; one that fails keeps its
    /// error. Manifest entries not supplied are recorded as missing.
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = (ArtifactId, Artifact)>) -> Self {
        let mut entries: BTreeMap<ArtifactId, Result<Arc<Artifact>, String>> = ids::MANIFEST
            .iter()
            .map(|id| (*id, Err("not provided".to_string())))
            .collect();
        for (id, artifact) in artifacts {
            let result = match artifact.validate() {
                Ok(()) => Ok(Arc::new(artifact)),
                Err(e) => {
                    warn!(artifact = %id, error = %e, "Artifact rejected");
                    Err(e.to_string())
                }
            };
            entries.insert(id, result);
        }
        Self {
            source: None,
            entries,
        }
    }

    /// Directory the registry was loaded from (None for in-memory registries)
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Shared handle to a loaded artifact
    ///
    /// A missing or failed entry is reported as `ArtifactUnavailable` for the
    /// artifact's pipeline.
    pub fn get(&self, id: ArtifactId) -> Result<Arc<Artifact>, PipelineError> {
        match self.entries.get(&id) {
            Some(Ok(artifact)) => Ok(Arc::clone(artifact)),
            Some(Err(reason)) => Err(PipelineError::ArtifactUnavailable {
                pipeline: id.pipeline,
                reason: format!("artifact '{}' failed to load ({})", id, reason),
            }),
            None => Err(PipelineError::ArtifactUnavailable {
                pipeline: id.pipeline,
                reason: format!("artifact '{}' is not in the manifest", id),
            }),
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_ok()).count()
    }

    /// Per-artifact load report in manifest order
    pub fn status(&self) -> Vec<ArtifactStatus> {
        ids::MANIFEST
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (id, entry)))
            .map(|(id, entry)| match entry {
                Ok(artifact) => ArtifactStatus {
                    id: id.to_string(),
                    pipeline: id.pipeline,
                    loaded: true,
                    kind: Some(artifact.kind()),
                    input_shape: Some(artifact.input_shape()),
                    output_shape: Some(artifact.output_shape()),
                    error: None,
                },
                Err(reason) => ArtifactStatus {
                    id: id.to_string(),
                    pipeline: id.pipeline,
                    loaded: false,
                    kind: None,
                    input_shape: None,
                    output_shape: None,
                    error: Some(reason.clone()),
                },
            })
            .collect()
    }
}
