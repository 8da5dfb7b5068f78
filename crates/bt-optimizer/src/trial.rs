//! Run configuration, best-so-far tracking and trial bookkeeping.

use bt_types::{config_error, AcquisitionError, BtError, BtResult, Phase, RunId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::acquisition::{AcquisitionFunction, AcquisitionKind, AcquisitionParams};
use crate::gp::DEFAULT_KERNEL_WIDTH;
use crate::progress::ProgressSender;
use crate::random::RandomSource;

/// ChaCha stream reserved for randomized acquisition when a run is seeded.
const ACQUISITION_STREAM: u64 = 1;

/// Top-level configuration for an optimization run.
///
/// Clones share the acquisition random source; [`crate::Optimizer::new`]
/// forks it so each run draws from its own generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of surrogate-guided evaluations.
    pub iterations: usize,

    /// Number of uniformly random evaluations before guided search.
    pub initial_samples: usize,

    /// Random candidates scored per guided iteration.
    pub num_candidates: usize,

    pub acquisition: AcquisitionKind,

    /// Custom scorer used instead of `acquisition` when set.
    #[serde(skip)]
    pub acquisition_fn: Option<Arc<dyn AcquisitionFunction>>,

    pub acq_params: AcquisitionParams,

    /// RBF kernel width of the surrogate.
    pub kernel_width: f64,

    /// Seed for candidate sampling; entropy-seeded when absent.
    pub seed: Option<u64>,

    /// Optional best-effort progress sink.
    #[serde(skip)]
    pub progress: Option<ProgressSender>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            initial_samples: 10,
            num_candidates: 50,
            acquisition: AcquisitionKind::Ucb,
            acquisition_fn: None,
            acq_params: AcquisitionParams::default(),
            kernel_width: DEFAULT_KERNEL_WIDTH,
            seed: None,
            progress: None,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration. Unspecified fields take their defaults.
    pub fn from_json(json: &str) -> BtResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(match config.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> BtResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_initial_samples(mut self, n: usize) -> Self {
        self.initial_samples = n;
        self
    }

    pub fn with_num_candidates(mut self, n: usize) -> Self {
        self.num_candidates = n;
        self
    }

    pub fn with_acquisition(mut self, kind: AcquisitionKind) -> Self {
        self.acquisition = kind;
        self
    }

    /// Score candidates with a user-supplied strategy.
    pub fn with_acquisition_fn(mut self, function: Arc<dyn AcquisitionFunction>) -> Self {
        self.acquisition_fn = Some(function);
        self
    }

    pub fn with_acq_params(mut self, params: AcquisitionParams) -> Self {
        self.acq_params = params;
        self
    }

    pub fn with_kernel_width(mut self, sigma: f64) -> Self {
        self.kernel_width = sigma;
        self
    }

    /// Make the run reproducible: candidate sampling uses `seed` and
    /// randomized acquisition gets its own stream of the same seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.acq_params.random_source =
            Some(RandomSource::from_seed_and_stream(seed, ACQUISITION_STREAM));
        self
    }

    pub fn with_progress(mut self, sender: ProgressSender) -> Self {
        self.progress = Some(sender);
        self
    }

    /// The strategy a run will score candidates with.
    pub fn acquisition_function(&self) -> &dyn AcquisitionFunction {
        match &self.acquisition_fn {
            Some(function) => function.as_ref(),
            None => self.acquisition.function(),
        }
    }

    /// Total number of objective evaluations the run will perform.
    pub fn total_evaluations(&self) -> usize {
        self.initial_samples + self.iterations
    }

    /// Fail fast on configurations that cannot run.
    ///
    /// Zero counts are accepted and simply skip their phase, except that
    /// guided iterations need at least one candidate to choose from.
    pub fn validate(&self) -> BtResult<()> {
        if self.iterations > 0 && self.num_candidates == 0 {
            return Err(config_error!(
                "num_candidates must be at least 1 when iterations is {}",
                self.iterations
            ));
        }
        if !(self.kernel_width.is_finite() && self.kernel_width > 0.0) {
            return Err(config_error!(
                "kernel_width must be a positive finite number, got {}",
                self.kernel_width
            ));
        }
        if !self.acq_params.beta.is_finite() || !self.acq_params.xi.is_finite() {
            return Err(config_error!(
                "acquisition beta and xi must be finite (beta = {}, xi = {})",
                self.acq_params.beta,
                self.acq_params.xi
            ));
        }
        if self.acquisition_fn.is_none()
            && self.acquisition.requires_random_source()
            && self.acq_params.random_source.is_none()
        {
            return Err(BtError::Acquisition(AcquisitionError::MissingRandomSource {
                strategy: self.acquisition.function().name().to_string(),
            }));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Best-so-far tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct BestInner<T> {
    params: Vec<T>,
    cost: f64,
}

/// Best parameters and cost seen in one run.
///
/// Updates are compare-and-replace under one lock, so the tracked cost never
/// increases regardless of how evaluations are scheduled.
#[derive(Debug)]
pub struct BestState<T> {
    inner: Mutex<BestInner<T>>,
}

impl<T: Clone> BestState<T> {
    /// Start from `initial` params with a cost of `f64::MAX`.
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            inner: Mutex::new(BestInner {
                params: initial,
                cost: f64::MAX,
            }),
        }
    }

    /// Replace the best if `cost` is strictly lower. Returns whether it did.
    pub fn offer(&self, params: &[T], cost: f64) -> bool {
        let mut best = self.inner.lock();
        if cost < best.cost {
            best.params.clear();
            best.params.extend_from_slice(params);
            best.cost = cost;
            true
        } else {
            false
        }
    }

    pub fn best_cost(&self) -> f64 {
        self.inner.lock().cost
    }

    pub fn snapshot(&self) -> (Vec<T>, f64) {
        let best = self.inner.lock();
        (best.params.clone(), best.cost)
    }

    pub fn into_inner(self) -> (Vec<T>, f64) {
        let best = self.inner.into_inner();
        (best.params, best.cost)
    }
}

// ---------------------------------------------------------------------------
// Trials and outcome
// ---------------------------------------------------------------------------

/// A single evaluated point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord<T> {
    /// 1-based position across the whole run.
    pub number: usize,
    pub phase: Phase,
    pub params: Vec<T>,
    pub cost: f64,
    pub elapsed: Duration,
    pub error: Option<String>,
    /// Acquisition score that selected this point (guided phase only).
    pub acquisition_score: Option<f64>,
}

impl<T> TrialRecord<T> {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a completed optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome<T> {
    pub run_id: RunId,
    pub best_params: Vec<T>,
    pub best_cost: f64,
    pub trials: Vec<TrialRecord<T>>,
    /// Progress events that could not be delivered.
    pub dropped_events: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T> OptimizationOutcome<T> {
    pub fn evaluations(&self) -> usize {
        self.trials.len()
    }

    pub fn failed_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.failed()).count()
    }

    pub fn trials_in(&self, phase: Phase) -> impl Iterator<Item = &TrialRecord<T>> {
        self.trials.iter().filter(move |t| t.phase == phase)
    }

    /// Running best cost after each trial.
    pub fn best_cost_history(&self) -> Vec<f64> {
        self.trials
            .iter()
            .scan(f64::MAX, |best, trial| {
                if trial.cost < *best {
                    *best = trial.cost;
                }
                Some(*best)
            })
            .collect()
    }
}
