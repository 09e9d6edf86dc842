//! Snapshot identifier generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of fresh identifiers for secondary documents
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> String {
        (**self).next_id()
    }
}

/// 16 lowercase hex characters from a random 64-bit value
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    rng: StdRng,
}

impl RandomIdGenerator {
    /// Seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence, for reproducible imports and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> String {
        format!("{:016x}", self.rng.gen::<u64>())
    }
}

/// `<prefix><n>` with `n` counting up from 1
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}{:06}", self.prefix, self.next)
    }
}
