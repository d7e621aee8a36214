//! Input/output helpers.
//!
//! - FeatureSet JSON read/write (`features`)

pub mod features;

pub use features::*;
