//! # bt-optimizer
//!
//! Gaussian-process guided parameter search for expensive benchmarks.
//!
//! Provides search space definitions, a kernel-weighted surrogate model,
//! acquisition strategies (UCB, probability of improvement, expected
//! improvement, Thompson sampling), a best-effort progress channel, and the
//! two-phase optimization driver that ties them together.

mod acquisition;
mod gp;
mod math;
mod measure;
mod optimizer;
mod progress;
mod random;
mod search;
mod trial;

pub use acquisition::{
    AcquisitionFunction, AcquisitionKind, AcquisitionParams, ExpectedImprovement,
    ProbabilityOfImprovement, ThompsonSampling, UpperConfidenceBound, DEFAULT_BETA, DEFAULT_XI,
};
pub use gp::{GaussianProcess, DEFAULT_KERNEL_WIDTH};
pub use math::{normal_cdf, normal_pdf};
pub use measure::{measure, Benchmark, Measurement, Objective, Timed, FAILURE_PENALTY};
pub use optimizer::{optimize, Optimizer};
pub use progress::{progress_channel, ProgressReceiver, ProgressSender};
pub use random::RandomSource;
pub use search::{to_features, Numeric, NumericKind, ParameterRange, SearchSpace};
pub use trial::{BestState, OptimizationOutcome, RunConfig, TrialRecord};
