//! Output Mapper
//!
//! Converts raw pipeline output into labeled, client-facing results. Every
//! label set is a closed enum with an explicit `Unknown` arm: an index outside
//! the vocabulary degrades to `Unknown` (logged at warn), never to an error.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::types::PipelineError;

// ============================================================================
// Class indices
// ============================================================================

/// Raw class index as emitted by a classifier
///
/// Classifiers emit `f64`; `2.0` and an integer `2` name the same label.
/// Fractional, negative or non-finite values name nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassIndex(pub f64);

impl ClassIndex {
    /// Read the single value a classifier pipeline produces
    pub fn from_output(output: &[f64]) -> Result<Self, PipelineError> {
        match output {
            [value] => Ok(ClassIndex(*value)),
            _ => Err(PipelineError::Unexpected(format!(
                "classifier produced {} values, expected 1",
                output.len()
            ))),
        }
    }

    /// Vocabulary position, if the value names one
    pub fn position(&self) -> Option<usize> {
        let value = self.0;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
            Some(value as usize)
        } else {
            None
        }
    }
}

impl From<usize> for ClassIndex {
    fn from(index: usize) -> Self {
        ClassIndex(index as f64)
    }
}

impl fmt::Display for ClassIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Planet-type label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanetType {
    Jovian,
    Miniterran,
    Neptunian,
    Subterran,
    Superterran,
    Terran,
    Unknown,
}

impl PlanetType {
    /// Labels in class-index order
    pub const VOCABULARY: [PlanetType; 6] = [
        PlanetType::Jovian,
        PlanetType::Miniterran,
        PlanetType::Neptunian,
        PlanetType::Subterran,
        PlanetType::Superterran,
        PlanetType::Terran,
    ];

    pub fn from_index(index: ClassIndex) -> Self {
        match index.position().and_then(|i| Self::VOCABULARY.get(i)) {
            Some(label) => *label,
            None => {
                warn!(index = %index, "Planet-type class index outside vocabulary");
                PlanetType::Unknown
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanetType::Jovian => "Jovian",
            PlanetType::Miniterran => "Miniterran",
            PlanetType::Neptunian => "Neptunian",
            PlanetType::Subterran => "Subterran",
            PlanetType::Superterran => "Superterran",
            PlanetType::Terran => "Terran",
            PlanetType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PlanetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Radiation-level label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RadiationLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RadiationLevel {
    /// Labels in class-index order
    pub const VOCABULARY: [RadiationLevel; 3] =
        [RadiationLevel::Low, RadiationLevel::Medium, RadiationLevel::High];

    pub fn from_index(index: ClassIndex) -> Self {
        match index.position().and_then(|i| Self::VOCABULARY.get(i)) {
            Some(label) => *label,
            None => {
                warn!(index = %index, "Radiation class index outside vocabulary");
                RadiationLevel::Unknown
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RadiationLevel::Low => "Low",
            RadiationLevel::Medium => "Medium",
            RadiationLevel::High => "High",
            RadiationLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RadiationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Gas composition
// ============================================================================

/// Atmospheric gas species, in decoder output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GasSpecies {
    H2O,
    CO2,
    O2,
    N2,
    CH4,
    N2O,
    CO,
    O3,
    SO2,
    NH3,
    C2H6,
    NO2,
}

impl GasSpecies {
    pub const ALL: [GasSpecies; 12] = [
        GasSpecies::H2O,
        GasSpecies::CO2,
        GasSpecies::O2,
        GasSpecies::N2,
        GasSpecies::CH4,
        GasSpecies::N2O,
        GasSpecies::CO,
        GasSpecies::O3,
        GasSpecies::SO2,
        GasSpecies::NH3,
        GasSpecies::C2H6,
        GasSpecies::NO2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GasSpecies::H2O => "H2O",
            GasSpecies::CO2 => "CO2",
            GasSpecies::O2 => "O2",
            GasSpecies::N2 => "N2",
            GasSpecies::CH4 => "CH4",
            GasSpecies::N2O => "N2O",
            GasSpecies::CO => "CO",
            GasSpecies::O3 => "O3",
            GasSpecies::SO2 => "SO2",
            GasSpecies::NH3 => "NH3",
            GasSpecies::C2H6 => "C2H6",
            GasSpecies::NO2 => "NO2",
        }
    }
}

impl fmt::Display for GasSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded gas fractions keyed by species
///
/// Values are reported as decoded; they are not renormalized to sum to one.
/// Serializes as a JSON object whose keys follow [`GasSpecies::ALL`].
#[derive(Debug, Clone, PartialEq)]
pub struct GasComposition([f64; 12]);

impl GasComposition {
    /// Label decoder output positionally; every fraction must be finite
    pub fn from_values(values: &[f64]) -> Result<Self, PipelineError> {
        let values: [f64; 12] = values.try_into().map_err(|_| {
            PipelineError::Unexpected(format!(
                "decoder produced {} values, expected {}",
                values.len(),
                GasSpecies::ALL.len()
            ))
        })?;
        if let Some((species, _)) = GasSpecies::ALL.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(PipelineError::Unexpected(format!(
                "decoder produced a non-finite {} fraction",
                species
            )));
        }
        Ok(Self(values))
    }

    pub fn get(&self, species: GasSpecies) -> f64 {
        // ALL is in declaration order, so the discriminant is the position
        self.0[species as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (GasSpecies, f64)> + '_ {
        GasSpecies::ALL.iter().copied().zip(self.0.iter().copied())
    }

    pub fn values(&self) -> &[f64; 12] {
        &self.0
    }
}

impl Serialize for GasComposition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (species, value) in self.iter() {
            map.serialize_entry(species.as_str(), &value)?;
        }
        map.end()
    }
}

// ============================================================================
// Habitability
// ============================================================================

/// Habitability scores, in regressor output order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(non_snake_case)]
pub struct HabitabilityScores {
    pub P_HABZONE_OPT: f64,
    pub P_HABZONE_CON: f64,
    pub P_HABITABLE: f64,
    pub P_ESI: f64,
}

impl HabitabilityScores {
    pub const FIELDS: [&'static str; 4] = ["P_HABZONE_OPT", "P_HABZONE_CON", "P_HABITABLE", "P_ESI"];

    /// Label regressor output positionally; every score must be finite
    pub fn from_values(values: &[f64]) -> Result<Self, PipelineError> {
        let [opt, con, habitable, esi] = values else {
            return Err(PipelineError::Unexpected(format!(
                "regressor produced {} values, expected {}",
                values.len(),
                Self::FIELDS.len()
            )));
        };
        if let Some((name, _)) = Self::FIELDS
            .iter()
            .zip(values)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(PipelineError::Unexpected(format!(
                "regressor produced a non-finite {}",
                name
            )));
        }
        Ok(Self {
            P_HABZONE_OPT: *opt,
            P_HABZONE_CON: *con,
            P_HABITABLE: *habitable,
            P_ESI: *esi,
        })
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PlanetTypePrediction {
    pub prediction: PlanetType,
    pub pl_mass: f64,
    pub pl_radius: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadiationPrediction {
    pub prediction: RadiationLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct GasPrediction {
    pub predicted_gases: GasComposition,
}
