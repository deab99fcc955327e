//! Feature Deriver
//!
//! Turns typed request payloads into the exact inputs each pipeline's first
//! stage expects. Order is part of the contract: every vector is assembled
//! from a fixed name list, never from map iteration.
//!
//! Preconditions are checked here, before any artifact is touched:
//! - planet-type: mass and radius must be finite and strictly positive
//! - radiation: all seven values must be finite
//! - gas: spectrum and planetary features must be finite; their widths are checked by the fusion pipeline
//! - habitability: fields may be absent; absent values become NaN for the imputer

use serde::Deserialize;

use crate::types::{PipelineError, Tensor};

/// π as used when the planet-type artifacts were fitted
///
/// The reference run `{mass: 1, radius: 1}` yields a density of ≈ 0.2389,
/// which this value reproduces; keep it in step with the fitted scaler.
pub const DENSITY_PI: f64 = 3.14;

/// Planet-type feature order
pub const PLANET_TYPE_FEATURES: [&str; 3] = ["pl_mass", "pl_radius", "pl_density"];

/// Radiation feature order (radius before mass, unlike the planet-type vector)
pub const RADIATION_FEATURES: [&str; 7] = [
    "stellar_temp",
    "stellar_metal",
    "stellar_log_lum",
    "stellar_age",
    "stellar_dist",
    "pl_radius",
    "pl_mass",
];

/// Habitability feature order
pub const HABITABILITY_FEATURES: [&str; 9] = [
    "P_TEMP_SURF",
    "P_RADIUS",
    "P_TEMP_SURF_MIN",
    "S_LOG_G",
    "S_DISTANCE_ERROR_MIN",
    "P_ECCENTRICITY_LIMIT",
    "S_ABIO_ZONE",
    "P_FLUX",
    "S_DISTANCE_ERROR_MAX",
];

/// Ordered, named feature row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair names and values position by position
    pub fn named(names: &[&str], values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            values,
        }
    }

    /// Caller-ordered values without semantic names (`feature_0`, `feature_1`, ...)
    pub fn positional(values: Vec<f64>) -> Self {
        Self {
            names: (0..values.len()).map(|i| format!("feature_{}", i)).collect(),
            values,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// `(1, n)` tensor for the first stage
    pub fn to_tensor(&self) -> Result<Tensor, PipelineError> {
        Tensor::row(self.values.clone())
    }
}

/// One spectral reading, in acquisition order
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSample(Vec<f64>);

impl SpectrumSample {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// `(1, length, 1)` tensor for the spectral encoder
    pub fn to_tensor(&self) -> Result<Tensor, PipelineError> {
        Tensor::sequence(self.0.clone())
    }
}

/// `mass / ((4/3)·π·radius³)`
pub fn density(mass: f64, radius: f64) -> f64 {
    mass / ((4.0 / 3.0) * DENSITY_PI * radius.powi(3))
}

fn require_finite(name: &str, value: f64) -> Result<f64, PipelineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PipelineError::InvalidInput(format!("{} must be a finite number", name)))
    }
}

fn require_positive(name: &str, value: f64) -> Result<f64, PipelineError> {
    let value = require_finite(name, value)?;
    if value <= 0.0 {
        return Err(PipelineError::InvalidInput(format!(
            "{} must be greater than zero",
            name
        )));
    }
    Ok(value)
}

// ============================================================================
// Request payloads
// ============================================================================

/// Planet-type request
#[derive(Debug, Clone, Deserialize)]
pub struct PlanetTypeRequest {
    #[serde(alias = "mass")]
    pub pl_mass: f64,
    #[serde(alias = "radius")]
    pub pl_radius: f64,
}

impl PlanetTypeRequest {
    /// `[mass, radius, density]`
    pub fn features(&self) -> Result<FeatureVector, PipelineError> {
        let mass = require_positive("Mass", self.pl_mass)?;
        let radius = require_positive("Radius", self.pl_radius)?;
        Ok(FeatureVector::named(
            &PLANET_TYPE_FEATURES,
            vec![mass, radius, density(mass, radius)],
        ))
    }
}

/// Radiation request
#[derive(Debug, Clone, Deserialize)]
pub struct RadiationRequest {
    pub stellar_temp: f64,
    pub stellar_metal: f64,
    pub stellar_log_lum: f64,
    pub stellar_age: f64,
    pub stellar_dist: f64,
    #[serde(alias = "mass")]
    pub pl_mass: f64,
    #[serde(alias = "radius")]
    pub pl_radius: f64,
}

impl RadiationRequest {
    /// `[stellar_temp, stellar_metal, stellar_log_lum, stellar_age, stellar_dist, radius, mass]`
    pub fn features(&self) -> Result<FeatureVector, PipelineError> {
        let values = [
            self.stellar_temp,
            self.stellar_metal,
            self.stellar_log_lum,
            self.stellar_age,
            self.stellar_dist,
            self.pl_radius,
            self.pl_mass,
        ];
        let values = RADIATION_FEATURES
            .iter()
            .zip(values)
            .map(|(name, value)| require_finite(name, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureVector::named(&RADIATION_FEATURES, values))
    }
}

/// Gas-composition request
#[derive(Debug, Clone, Deserialize)]
pub struct GasRequest {
    pub spectrum: Vec<f64>,
    pub planetary_features: Vec<f64>,
}

impl GasRequest {
    /// Spectrum unchanged plus caller-ordered planetary features
    ///
    /// Widths are checked against the stage contracts by the fusion pipeline.
    pub fn features(&self) -> Result<(SpectrumSample, FeatureVector), PipelineError> {
        if let Some(i) = self.spectrum.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(format!(
                "spectrum[{}] must be a finite number",
                i
            )));
        }
        if let Some(i) = self.planetary_features.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(format!(
                "planetary_features[{}] must be a finite number",
                i
            )));
        }
        Ok((
            SpectrumSample::new(self.spectrum.clone()),
            FeatureVector::positional(self.planetary_features.clone()),
        ))
    }
}

/// Habitability request
///
/// Every field is optional; missing values are imputed by the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(non_snake_case)]
pub struct HabitabilityRequest {
    #[serde(default)]
    pub P_TEMP_SURF: Option<f64>,
    #[serde(default)]
    pub P_RADIUS: Option<f64>,
    #[serde(default)]
    pub P_TEMP_SURF_MIN: Option<f64>,
    #[serde(default)]
    pub S_LOG_G: Option<f64>,
    #[serde(default)]
    pub S_DISTANCE_ERROR_MIN: Option<f64>,
    #[serde(default)]
    pub P_ECCENTRICITY_LIMIT: Option<f64>,
    #[serde(default)]
    pub S_ABIO_ZONE: Option<f64>,
    #[serde(default)]
    pub P_FLUX: Option<f64>,
    #[serde(default)]
    pub S_DISTANCE_ERROR_MAX: Option<f64>,
}

impl HabitabilityRequest {
    /// Nine-column row in declared order, NaN for missing values
    pub fn features(&self) -> Result<FeatureVector, PipelineError> {
        let values = [
            self.P_TEMP_SURF,
            self.P_RADIUS,
            self.P_TEMP_SURF_MIN,
            self.S_LOG_G,
            self.S_DISTANCE_ERROR_MIN,
            self.P_ECCENTRICITY_LIMIT,
            self.S_ABIO_ZONE,
            self.P_FLUX,
            self.S_DISTANCE_ERROR_MAX,
        ];
        let values = HABITABILITY_FEATURES
            .iter()
            .zip(values)
            .map(|(name, value)| match value {
                None => Ok(f64::NAN),
                Some(v) if v.is_infinite() => Err(PipelineError::InvalidInput(format!(
                    "{} must be a finite number",
                    name
                ))),
                Some(v) => Ok(v),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureVector::named(&HABITABILITY_FEATURES, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_density() {
        let d = density(1.0, 1.0);
        assert!((d - 0.2389).abs() < 1e-4, "density was {}", d);
    }

    #[test]
    fn test_planet_type_vector_order() {
        let request = PlanetTypeRequest {
            pl_mass: 2.0,
            pl_radius: 0.5,
        };
        let features = request.features().unwrap();
        assert_eq!(features.names(), &["pl_mass", "pl_radius", "pl_density"]);
        assert_eq!(features.values()[0], 2.0);
        assert_eq!(features.values()[1], 0.5);
        assert_eq!(features.values()[2], density(2.0, 0.5));
    }

    #[test]
    fn test_planet_type_rejects_non_positive() {
        for (mass, radius) in [(0.0, 1.0), (1.0, 0.0), (-1.0, 1.0), (1.0, -3.0)] {
            let request = PlanetTypeRequest {
                pl_mass: mass,
                pl_radius: radius,
            };
            assert!(matches!(
                request.features(),
                Err(PipelineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_planet_type_rejects_nan() {
        let request = PlanetTypeRequest {
            pl_mass: f64::NAN,
            pl_radius: 1.0,
        };
        assert!(matches!(request.features(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_radiation_vector_places_radius_before_mass() {
        let request = RadiationRequest {
            stellar_temp: 5778.0,
            stellar_metal: 0.01,
            stellar_log_lum: 0.0,
            stellar_age: 4.6,
            stellar_dist: 10.0,
            pl_mass: 1.0,
            pl_radius: 2.0,
        };
        let features = request.features().unwrap();
        assert_eq!(features.values(), &[5778.0, 0.01, 0.0, 4.6, 10.0, 2.0, 1.0]);
        assert_eq!(features.get("pl_radius"), Some(2.0));
        assert_eq!(features.get("pl_mass"), Some(1.0));
    }

    #[test]
    fn test_gas_features_pass_through_unchanged() {
        let request = GasRequest {
            spectrum: vec![0.5; 100],
            planetary_features: vec![1.0, 2.0, 3.0],
        };
        let (spectrum, features) = request.features().unwrap();
        assert_eq!(spectrum.len(), 100);
        assert_eq!(spectrum.to_tensor().unwrap().shape(), &[1, 100, 1]);
        assert_eq!(features.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(features.names()[2], "feature_2");
    }

    #[test]
    fn test_gas_empty_inputs_are_left_to_the_pipeline() {
        let request = GasRequest {
            spectrum: vec![],
            planetary_features: vec![],
        };
        let (spectrum, features) = request.features().unwrap();
        assert!(spectrum.is_empty());
        assert!(features.is_empty());
    }

    #[test]
    fn test_gas_rejects_non_finite_values() {
        let request = GasRequest {
            spectrum: vec![0.5, f64::NAN],
            planetary_features: vec![1.0],
        };
        assert!(matches!(request.features(), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_habitability_missing_fields_become_nan() {
        let request = HabitabilityRequest {
            P_TEMP_SURF: Some(288.0),
            P_FLUX: Some(1.0),
            ..Default::default()
        };
        let features = request.features().unwrap();
        assert_eq!(features.len(), 9);
        assert_eq!(features.get("P_TEMP_SURF"), Some(288.0));
        assert_eq!(features.get("P_FLUX"), Some(1.0));
        assert!(features.get("S_LOG_G").unwrap().is_nan());
    }

    #[test]
    fn test_habitability_json_field_names() {
        let json = r#"{ "P_TEMP_SURF": 250.0, "P_RADIUS": 1.1, "S_ABIO_ZONE": null }"#;
        let request: HabitabilityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.P_RADIUS, Some(1.1));
        assert_eq!(request.S_ABIO_ZONE, None);
    }

    #[test]
    fn test_request_aliases() {
        let request: PlanetTypeRequest = serde_json::from_str(r#"{ "mass": 1.0, "radius": 2.0 }"#).unwrap();
        assert_eq!(request.pl_mass, 1.0);
        assert_eq!(request.pl_radius, 2.0);
    }
}
