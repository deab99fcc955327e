//! Test Helper Utilities
//!
//! Shared utilities for testing exo-predict

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;

pub use fixtures::{
    reference_artifacts, reference_registry, reference_service, write_artifacts,
    GAS_FEATURE_WIDTH, SPECTRUM_LENGTH,
};
pub use log_capture::LogCapture;
