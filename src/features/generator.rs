//! Random FeatureSet generation from the catalog domains.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::{FeatureSet, FeatureValue};
use crate::features::CATALOG;

/// Draws complete FeatureSets, one value per catalog entry.
///
/// Seeded generators are reproducible: the same seed yields the same sequence
/// of FeatureSets.
#[derive(Debug, Clone)]
pub struct FeatureGenerator {
    rng: StdRng,
    seed: Option<u64>,
}

impl FeatureGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn generate(&mut self) -> FeatureSet {
        let values: Vec<FeatureValue> = CATALOG
            .iter()
            .map(|spec| spec.domain.sample(&mut self.rng))
            .collect();
        FeatureSet::from_values(values)
    }
}
