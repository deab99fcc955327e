//! Deterministic reference artifacts
//!
//! Small hand-built artifacts with the same kinds, shapes and stage layout as
//! the production model tree. Values are chosen so outcomes are predictable:
//! - planet_type: a single decision path on radius (1.0 → Terran)
//! - radiation: PCA keeps only radius and mass; class scores are
//!   `[0, radius, mass]`, so the larger of the two decides Medium vs High
//! - gas: conv + pooling spectral encoder, dense tabular encoder, dense fusion,
//!   sigmoid decoder with 12 outputs
//! - habitability: median imputer, unit scaler, 4-output linear regressor

use exo_common::config::BranchSchedule;
use exo_predict::artifacts::{
    Activation, Artifact, DecisionTree, ForestClassifier, Layer, LinearClassifier,
    LinearRegressor, Padding, Pca, Sequential, SimpleImputer, StandardScaler, TreeNode,
};
use exo_predict::registry::{ids, ArtifactId, ArtifactRegistry};
use exo_predict::PredictionService;
use std::path::Path;

pub const SPECTRUM_LENGTH: usize = 100;
pub const GAS_FEATURE_WIDTH: usize = 7;

/// Small deterministic weight in [-0.5, 0.5]
fn weight(i: usize, j: usize, salt: usize) -> f64 {
    (((i * 31 + j * 17 + salt * 7) % 11) as f64 - 5.0) / 10.0
}

fn matrix(rows: usize, cols: usize, salt: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|i| (0..cols).map(|j| weight(i, j, salt)).collect())
        .collect()
}

fn identity_scaler(n: usize) -> Artifact {
    Artifact::StandardScaler(StandardScaler {
        mean: vec![0.0; n],
        scale: vec![1.0; n],
    })
}

fn planet_type_tree() -> DecisionTree {
    // Radius thresholds walk down a single chain of splits on feature 1
    let split = |threshold: f64, at: usize| TreeNode::Split {
        feature: 1,
        threshold,
        left: at + 1,
        right: at + 2,
    };
    DecisionTree {
        nodes: vec![
            split(0.5, 0),
            TreeNode::Leaf { class: 3 }, // Subterran
            split(0.9, 2),
            TreeNode::Leaf { class: 1 }, // Miniterran
            split(1.25, 4),
            TreeNode::Leaf { class: 5 }, // Terran
            split(2.0, 6),
            TreeNode::Leaf { class: 4 }, // Superterran
            split(6.0, 8),
            TreeNode::Leaf { class: 2 }, // Neptunian
            TreeNode::Leaf { class: 0 }, // Jovian
        ],
    }
}

fn spectral_encoder() -> Artifact {
    let kernels = vec![
        vec![vec![0.25], vec![0.5], vec![0.25]],
        vec![vec![-1.0], vec![0.0], vec![1.0]],
    ];
    Artifact::Sequential(
        Sequential::new(
            vec![SPECTRUM_LENGTH, 1],
            vec![
                Layer::Conv1d {
                    kernels,
                    bias: vec![0.1, 0.0],
                    padding: Padding::Valid,
                    activation: Activation::Relu,
                },
                Layer::GlobalAveragePooling1d,
            ],
        )
        .expect("spectral encoder shapes"),
    )
}

fn dense_network(input: usize, units: usize, activation: Activation, salt: usize) -> Artifact {
    Artifact::Sequential(
        Sequential::new(
            vec![input],
            vec![Layer::Dense {
                weights: matrix(units, input, salt),
                bias: vec![0.05; units],
                activation,
            }],
        )
        .expect("dense network shapes"),
    )
}

/// Every manifest artifact, in manifest order
pub fn reference_artifacts() -> Vec<(ArtifactId, Artifact)> {
    vec![
        (ids::PLANET_TYPE_SCALER, identity_scaler(3)),
        (
            ids::PLANET_TYPE_CLASSIFIER,
            Artifact::ForestClassifier(ForestClassifier {
                n_features: 3,
                n_classes: 6,
                trees: vec![planet_type_tree(), planet_type_tree(), planet_type_tree()],
                classes: None,
            }),
        ),
        (ids::RADIATION_SCALER, identity_scaler(7)),
        (
            ids::RADIATION_PCA,
            Artifact::Pca(Pca {
                mean: vec![0.0; 7],
                components: vec![
                    vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
                ],
            }),
        ),
        (
            ids::RADIATION_CLASSIFIER,
            Artifact::LinearClassifier(LinearClassifier {
                weights: vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
                bias: vec![0.0, 0.0, 0.0],
                classes: None,
            }),
        ),
        (ids::GAS_SPECTRAL_ENCODER, spectral_encoder()),
        (
            ids::GAS_TABULAR_SCALER,
            Artifact::StandardScaler(StandardScaler {
                mean: vec![1.0; GAS_FEATURE_WIDTH],
                scale: vec![2.0; GAS_FEATURE_WIDTH],
            }),
        ),
        (
            ids::GAS_TABULAR_ENCODER,
            dense_network(GAS_FEATURE_WIDTH, 3, Activation::Relu, 1),
        ),
        (ids::GAS_FUSION, dense_network(5, 8, Activation::Tanh, 2)),
        (ids::GAS_DECODER, dense_network(8, 12, Activation::Sigmoid, 3)),
        (
            ids::HABITABILITY_IMPUTER,
            Artifact::SimpleImputer(SimpleImputer {
                statistics: vec![255.0, 1.2, 230.0, 4.4, 0.5, 0.3, 0.9, 1.1, 0.5],
            }),
        ),
        (
            ids::HABITABILITY_SCALER,
            Artifact::StandardScaler(StandardScaler {
                mean: vec![255.0, 1.2, 230.0, 4.4, 0.5, 0.3, 0.9, 1.1, 0.5],
                scale: vec![50.0, 1.0, 50.0, 0.5, 1.0, 0.2, 0.5, 1.0, 1.0],
            }),
        ),
        (
            ids::HABITABILITY_REGRESSOR,
            Artifact::LinearRegressor(LinearRegressor {
                weights: matrix(4, 9, 4),
                bias: vec![0.4, 0.3, 0.2, 0.6],
            }),
        ),
    ]
}

/// In-memory registry holding every reference artifact except `skip`
pub fn reference_registry(skip: &[ArtifactId]) -> ArtifactRegistry {
    ArtifactRegistry::from_artifacts(
        reference_artifacts()
            .into_iter()
            .filter(|(id, _)| !skip.contains(id)),
    )
}

/// Service over the full reference registry
pub fn reference_service(schedule: BranchSchedule) -> PredictionService {
    PredictionService::new(&reference_registry(&[]), schedule)
}

/// Write every reference artifact except `skip` under `models_dir`
pub fn write_artifacts(models_dir: &Path, skip: &[ArtifactId]) {
    for (id, artifact) in reference_artifacts() {
        if skip.contains(&id) {
            continue;
        }
        let path = id.path_in(models_dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, artifact.to_json().unwrap()).unwrap();
    }
}
