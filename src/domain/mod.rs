//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the prediction target (`Tab`)
//! - feature values and the fixed-key `FeatureSet`
//! - request and response bodies (`PredictionRequest`, `PredictionResult`)

pub mod types;

pub use types::*;
