//! # Exo Common Library
//!
//! Shared code for the exoplanet inference workspace:
//! - Error and result types
//! - Configuration loading (TOML file, environment, compiled defaults)

pub mod config;
pub mod error;

pub use error::{Error, Result};
