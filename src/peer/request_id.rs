// src/peer/request_id.rs

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Where outbound request identifiers come from. Identifiers are correlation
/// keys, not capability tokens: they only need to be unique among the
/// requests currently outstanding on one connection.
#[derive(Debug)]
pub enum IdSource {
    /// Draws from `0..10_000_000`, the range peers following the original
    /// schema use. Accidental collisions are rare, not impossible.
    Random,
    /// Per-connection monotonic counter for stronger collision avoidance.
    /// Still numeric on the wire.
    Sequential(AtomicU64),
}

impl IdSource {
    pub fn sequential() -> Self {
        IdSource::Sequential(AtomicU64::new(1))
    }

    pub fn next_id(&self) -> u64 {
        match self {
            IdSource::Random => rand::rng().random_range(0..10_000_000),
            IdSource::Sequential(counter) => counter.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for IdSource {
    fn default() -> Self {
        IdSource::Random
    }
}
