//! Progress snapshots published while an optimization run is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique optimization run identifier.
pub type RunId = Uuid;

/// The two phases of a run, executed strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Uniform random exploration used to seed the surrogate.
    InitialSampling,
    /// Surrogate-guided search driven by the acquisition function.
    Optimization,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialSampling => "InitialSampling",
            Self::Optimization => "Optimization",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run after one evaluation.
///
/// Parameters are carried as `f64` regardless of the run's numeric kind so
/// that continuous runs report their actual trial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: RunId,
    pub phase: Phase,
    /// 1-based index within the current phase.
    pub current_iteration: usize,
    /// Number of evaluations the current phase will perform.
    pub total_iterations: usize,
    pub current_params: Vec<f64>,
    pub best_params_so_far: Vec<f64>,
    pub best_cost_so_far: f64,
    pub last_cost: f64,
    /// Whether this evaluation replaced the run's best.
    pub improved: bool,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Whether this event reports the final evaluation of its phase.
    pub fn is_phase_complete(&self) -> bool {
        self.current_iteration >= self.total_iterations
    }
}
