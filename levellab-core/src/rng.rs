//! Deterministic RNG hierarchy.
//!
//! A master seed generates deterministic sub-seeds for each `(label, iteration)`
//! pair. Sub-seeds are derived via BLAKE3 hashing, so the seed handed to the
//! genetic search or the synthetic data generator doesn't depend on what else
//! was seeded first.

use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a deterministic sub-seed for a specific (label, iteration).
    pub fn sub_seed(&self, label: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Create a seeded StdRng from a sub-seed.
    pub fn rng_for(&self, label: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(label, iteration))
    }
}
