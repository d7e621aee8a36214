//! Feature catalog and random test-vector generation.
//!
//! - the static per-feature table (`catalog`)
//! - seeded FeatureSet generation over that table (`generator`)

pub mod catalog;
pub mod generator;

pub use catalog::*;
pub use generator::*;
