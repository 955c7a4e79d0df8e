//! Simulated transient failures
//!
//! POSTs are failed with `503` at a fixed rate so clients can exercise their
//! retry paths. The random draws come from a [`FaultSource`] chosen once at
//! start-up; tests plug in a [`SequenceSource`] to make the draws scripted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SinkError};

/// Source of percentile draws in `0..100`
pub trait FaultSource: Send + Sync {
    /// Next draw, always below 100
    fn next_percentile(&self) -> u32;
}

/// Pseudo-random draws, optionally seeded
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Create a source seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a reproducible source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FaultSource for RandomSource {
    fn next_percentile(&self) -> u32 {
        self.rng.lock().gen_range(0..100)
    }
}

/// Replays a fixed list of draws, wrapping around at the end
pub struct SequenceSource {
    draws: Vec<u32>,
    cursor: AtomicUsize,
}

impl SequenceSource {
    /// Create a source from scripted draws (values are taken modulo 100)
    pub fn new(draws: Vec<u32>) -> Self {
        let draws = if draws.is_empty() { vec![99] } else { draws };
        Self {
            draws: draws.into_iter().map(|d| d % 100).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Every percentile once, in ascending order
    pub fn uniform() -> Self {
        Self::new((0..100).collect())
    }

    /// A source that never trips the injector
    pub fn never() -> Self {
        Self::new(vec![99])
    }
}

impl FaultSource for SequenceSource {
    fn next_percentile(&self) -> u32 {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.draws[idx % self.draws.len()]
    }
}

/// Decides whether a request is failed on purpose
#[derive(Clone)]
pub struct FaultInjector {
    source: Arc<dyn FaultSource>,
    rate_percent: u32,
}

impl FaultInjector {
    /// Create an injector failing `rate_percent` out of every hundred draws
    pub fn new(source: Arc<dyn FaultSource>, rate_percent: u32) -> Result<Self> {
        if rate_percent > 100 {
            return Err(SinkError::Configuration(format!(
                "failure rate must be between 0 and 100 percent, got {}",
                rate_percent
            )));
        }
        Ok(Self {
            source,
            rate_percent,
        })
    }

    /// An injector that never fails anything
    pub fn disabled() -> Self {
        Self {
            source: Arc::new(SequenceSource::never()),
            rate_percent: 0,
        }
    }

    /// Configured failure rate
    pub fn rate_percent(&self) -> u32 {
        self.rate_percent
    }

    /// Draw once and report whether this request should fail
    pub fn should_fail(&self) -> bool {
        self.source.next_percentile() < self.rate_percent
    }
}

impl std::fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInjector")
            .field("rate_percent", &self.rate_percent)
            .finish()
    }
}
