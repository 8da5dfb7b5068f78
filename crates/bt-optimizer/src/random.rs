//! Run-local random source shared by sampling and randomized acquisition.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to a single seeded generator.
///
/// Clones share the same generator; every draw takes the exclusive lock, so
/// the handle can be passed to concurrent candidate generators without
/// racing. Each optimization run must construct its own source.
#[derive(Clone)]
pub struct RandomSource {
    rng: Arc<Mutex<ChaCha8Rng>>,
    seed: Option<u64>,
}

impl RandomSource {
    /// Deterministic source for reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::from_seed_and_stream(seed, 0)
    }

    /// Deterministic source on an independent ChaCha stream of `seed`.
    pub fn from_seed_and_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self {
            rng: Arc::new(Mutex::new(rng)),
            seed: Some(seed),
        }
    }

    /// Source seeded from the thread-local entropy generator.
    pub fn from_entropy() -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::from_rng(&mut rand::rng()))),
            seed: None,
        }
    }

    /// Independent generator seeded from this one's next output.
    ///
    /// Deterministic for seeded sources; the child keeps the parent's seed
    /// for reporting.
    pub fn fork(&self) -> Self {
        let rng = self.with_rng(|rng| ChaCha8Rng::from_rng(rng));
        Self {
            rng: Arc::new(Mutex::new(rng)),
            seed: self.seed,
        }
    }

    /// The seed this source was built from, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Run `f` with exclusive access to the generator.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> R) -> R {
        let mut rng = self.rng.lock();
        f(&mut rng)
    }

    /// One draw from N(0, 1).
    pub fn standard_normal(&self) -> f64 {
        self.with_rng(|rng| rng.sample(StandardNormal))
    }

    /// One draw from U[0, 1).
    pub fn uniform(&self) -> f64 {
        self.with_rng(|rng| rng.random::<f64>())
    }

    /// Whether two handles refer to the same underlying generator.
    pub fn shares_state_with(&self, other: &RandomSource) -> bool {
        Arc::ptr_eq(&self.rng, &other.rng)
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
