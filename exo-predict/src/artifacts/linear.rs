//! Linear models: multinomial classifier and multi-output regressor

use serde::{Deserialize, Serialize};

use super::{affine, check_len, check_matrix, into_values, matrix, sample_tensor, vector, ArtifactError};
use crate::types::{Shape, Transform};

/// Linear classifier: argmax over `W·x + b`
///
/// `weights` holds one row per class. The emitted value is `classes[argmax]`
/// when explicit class values are present, otherwise the row position.
/// Ties resolve to the first class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<f64>>,
}

impl LinearClassifier {
    fn n_features(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    /// Raw class scores `W·x + b`
    fn scores(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        let x = sample_tensor(sample, &[sample.len()])?;
        into_values(&affine(&x, &matrix(&self.weights)?, &vector(&self.bias)?)?)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.weights.is_empty() || self.n_features() == 0 {
            return Err(ArtifactError::Invalid(
                "classifier needs at least one class and one feature".to_string(),
            ));
        }
        check_matrix("classifier weight", &self.weights, self.n_features())?;
        if self.bias.len() != self.weights.len() {
            return Err(ArtifactError::Invalid(format!(
                "classifier has {} classes but {} bias terms",
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some(classes) = &self.classes {
            if classes.len() != self.weights.len() {
                return Err(ArtifactError::Invalid(format!(
                    "classifier has {} weight rows but {} class values",
                    self.weights.len(),
                    classes.len()
                )));
            }
        }
        Ok(())
    }
}

impl Transform for LinearClassifier {
    fn kind(&self) -> &'static str {
        "linear_classifier"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.n_features())
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(1)
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.n_features())?;
        let scores = self.scores(sample)?;
        let best = argmax(&scores).ok_or_else(|| {
            ArtifactError::Invalid("classifier produced non-finite scores".to_string())
        })?;
        let class = match &self.classes {
            Some(classes) => *classes.get(best).ok_or_else(|| {
                ArtifactError::Invalid(format!("no class value for score row {}", best))
            })?,
            None => best as f64,
        };
        Ok(vec![class])
    }
}

/// Multi-output linear regressor: `W·x + b`, one row per output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LinearRegressor {
    fn n_features(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.weights.is_empty() || self.n_features() == 0 {
            return Err(ArtifactError::Invalid(
                "regressor needs at least one output and one feature".to_string(),
            ));
        }
        check_matrix("regressor weight", &self.weights, self.n_features())?;
        if self.bias.len() != self.weights.len() {
            return Err(ArtifactError::Invalid(format!(
                "regressor has {} outputs but {} bias terms",
                self.weights.len(),
                self.bias.len()
            )));
        }
        Ok(())
    }
}

impl Transform for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear_regressor"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.n_features())
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(self.weights.len())
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.n_features())?;
        let x = sample_tensor(sample, &[sample.len()])?;
        into_values(&affine(&x, &matrix(&self.weights)?, &vector(&self.bias)?)?)
    }
}

/// Index of the largest finite score (first wins on ties)
fn argmax(scores: &[f64]) -> Option<usize> {
    if scores.iter().any(|s| !s.is_finite()) {
        return None;
    }
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}
