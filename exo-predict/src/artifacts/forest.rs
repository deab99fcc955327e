//! Decision forest classifier
//!
//! Trees are stored as flat node arrays. A split sends a sample to `left`
//! when `x[feature] <= threshold`, otherwise to `right`. Child indices must
//! point forward in the array, so every walk terminates.

use serde::{Deserialize, Serialize};

use super::{check_len, ArtifactError};
use crate::types::{Shape, Transform};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid("tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(ArtifactError::Invalid(format!(
                            "node {} splits on feature {} of {}",
                            i, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ArtifactError::Invalid(format!(
                            "node {} has a non-finite threshold",
                            i
                        )));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(ArtifactError::Invalid(format!(
                                "node {} has out-of-order child {}",
                                i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { class } => {
                    if *class >= n_classes {
                        return Err(ArtifactError::Invalid(format!(
                            "leaf {} votes for class {} of {}",
                            i, class, n_classes
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, sample: &[f64]) -> usize {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Majority-vote ensemble of decision trees
///
/// Emits `classes[winner]` when explicit class values are present, otherwise
/// the winning class position. Vote ties resolve to the lowest class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<f64>>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.n_features == 0 || self.n_classes == 0 || self.trees.is_empty() {
            return Err(ArtifactError::Invalid(
                "forest needs features, classes and at least one tree".to_string(),
            ));
        }
        if let Some(classes) = &self.classes {
            if classes.len() != self.n_classes {
                return Err(ArtifactError::Invalid(format!(
                    "forest declares {} classes but lists {} class values",
                    self.n_classes,
                    classes.len()
                )));
            }
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| ArtifactError::Invalid(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }
}

impl Transform for ForestClassifier {
    fn kind(&self) -> &'static str {
        "forest_classifier"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.n_features)
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(1)
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.n_features)?;
        if sample.iter().any(|x| !x.is_finite()) {
            return Err(ArtifactError::Invalid(
                "forest input contains non-finite values".to_string(),
            ));
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)] += 1;
        }

        let mut winner = 0;
        for (class, count) in votes.iter().enumerate() {
            if *count > votes[winner] {
                winner = class;
            }
        }

        let class = match &self.classes {
            Some(classes) => classes[winner],
            None => winner as f64,
        };
        Ok(vec![class])
    }
}
