//! Preprocessing artifacts: scaling, dimensionality reduction, imputation

use serde::{Deserialize, Serialize};

use super::{check_len, check_matrix, into_values, matrix, sample_tensor, vector, ArtifactError};
use crate::types::{Shape, Transform};

/// Standardization: `(x - mean) / scale`, per feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.mean.is_empty() {
            return Err(ArtifactError::Invalid("scaler has no features".to_string()));
        }
        if self.mean.len() != self.scale.len() {
            return Err(ArtifactError::Invalid(format!(
                "scaler mean has {} features but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self.scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "scaler scale[{}] must be finite and non-zero",
                i
            )));
        }
        Ok(())
    }
}

impl Transform for StandardScaler {
    fn kind(&self) -> &'static str {
        "standard_scaler"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.mean.len())
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(self.mean.len())
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.mean.len())?;
        let x = sample_tensor(sample, &[sample.len()])?;
        let scaled = x
            .broadcast_sub(&vector(&self.mean)?)?
            .broadcast_div(&vector(&self.scale)?)?;
        into_values(&scaled)
    }
}

/// Principal component projection: `components · (x - mean)`
///
/// `components` holds one row per retained component, each as wide as the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pca {
    pub mean: Vec<f64>,
    pub components: Vec<Vec<f64>>,
}

impl Pca {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.mean.is_empty() || self.components.is_empty() {
            return Err(ArtifactError::Invalid(
                "pca needs at least one feature and one component".to_string(),
            ));
        }
        check_matrix("pca component", &self.components, self.mean.len())
    }
}

impl Transform for Pca {
    fn kind(&self) -> &'static str {
        "pca"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.mean.len())
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(self.components.len())
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.mean.len())?;
        let centered = sample_tensor(sample, &[sample.len()])?.broadcast_sub(&vector(&self.mean)?)?;
        let components_t = matrix(&self.components)?.t()?;
        into_values(&centered.matmul(&components_t)?)
    }
}

/// Missing-value imputation: NaN entries take the fitted per-feature statistic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub statistics: Vec<f64>,
}

impl SimpleImputer {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.statistics.is_empty() {
            return Err(ArtifactError::Invalid("imputer has no features".to_string()));
        }
        if let Some(i) = self.statistics.iter().position(|s| !s.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "imputer statistic[{}] is not finite",
                i
            )));
        }
        Ok(())
    }
}

impl Transform for SimpleImputer {
    fn kind(&self) -> &'static str {
        "simple_imputer"
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.statistics.len())
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(self.statistics.len())
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        check_len(sample, self.statistics.len())?;
        Ok(sample
            .iter()
            .zip(&self.statistics)
            .map(|(x, fill)| if x.is_nan() { *fill } else { *x })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_standardizes() {
        let scaler = StandardScaler {
            mean: vec![1.0, 10.0],
            scale: vec![2.0, 5.0],
        };
        assert_eq!(scaler.transform(&[3.0, 0.0]).unwrap(), vec![1.0, -2.0]);
    }

    #[test]
    fn test_scaler_rejects_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            scale: vec![0.0],
        };
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_scaler_wrong_length_is_dimension_error() {
        let scaler = StandardScaler {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
        };
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(ArtifactError::Dimension { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_pca_projects_centered_input() {
        let pca = Pca {
            mean: vec![1.0, 1.0, 1.0],
            components: vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.5, 0.5]],
        };
        assert_eq!(pca.output_shape(), Shape::vector(2));
        assert_eq!(pca.transform(&[3.0, 3.0, 5.0]).unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_pca_rejects_ragged_components() {
        let pca = Pca {
            mean: vec![0.0, 0.0],
            components: vec![vec![1.0]],
        };
        assert!(pca.validate().is_err());
    }

    #[test]
    fn test_imputer_fills_only_nan() {
        let imputer = SimpleImputer {
            statistics: vec![5.0, 6.0, 7.0],
        };
        let out = imputer.transform(&[f64::NAN, 1.0, f64::NAN]).unwrap();
        assert_eq!(out, vec![5.0, 1.0, 7.0]);
    }
}
