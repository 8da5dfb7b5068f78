//! Acquisition functions that rank candidates from surrogate predictions.
//!
//! The optimizer minimizes cost, so every strategy here follows one
//! convention: a lower score marks a more promising candidate. A variance of
//! exactly zero is not special-cased; PI and EI then divide by zero and the
//! caller decides how to rank the resulting non-finite scores.

use bt_types::{AcquisitionError, BtResult};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::{normal_cdf, normal_pdf};
use crate::random::RandomSource;

pub const DEFAULT_BETA: f64 = 2.0;
pub const DEFAULT_XI: f64 = 0.01;

/// Exploration knobs shared by all strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionParams {
    /// Exploration weight for UCB.
    pub beta: f64,
    /// Minimum improvement margin for PI and EI.
    pub xi: f64,
    /// Best cost observed so far; refreshed by the optimizer each iteration.
    pub best_so_far: f64,
    /// Run-local generator for randomized strategies.
    #[serde(skip, default = "default_random_source")]
    pub random_source: Option<RandomSource>,
}

fn default_random_source() -> Option<RandomSource> {
    Some(RandomSource::from_entropy())
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            xi: DEFAULT_XI,
            best_so_far: f64::MAX,
            random_source: default_random_source(),
        }
    }
}

impl AcquisitionParams {
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_xi(mut self, xi: f64) -> Self {
        self.xi = xi;
        self
    }

    pub fn with_random_source(mut self, source: Option<RandomSource>) -> Self {
        self.random_source = source;
        self
    }

    /// Signed improvement margin `mean − best − xi` shared by PI and EI.
    fn margin(&self, mean: f64) -> f64 {
        mean - self.best_so_far - self.xi
    }
}

/// Scores a candidate from its predicted mean and variance.
pub trait AcquisitionFunction: Send + Sync {
    fn score(&self, mean: f64, variance: f64, params: &AcquisitionParams) -> BtResult<f64>;

    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn AcquisitionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AcquisitionFunction").field(&self.name()).finish()
    }
}

/// `mean − beta·√variance`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperConfidenceBound;

impl AcquisitionFunction for UpperConfidenceBound {
    fn score(&self, mean: f64, variance: f64, params: &AcquisitionParams) -> BtResult<f64> {
        Ok(mean - params.beta * variance.sqrt())
    }

    fn name(&self) -> &'static str {
        "ucb"
    }
}

/// `Φ(z)` with `z = (mean − best − xi) / √variance`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilityOfImprovement;

impl AcquisitionFunction for ProbabilityOfImprovement {
    fn score(&self, mean: f64, variance: f64, params: &AcquisitionParams) -> BtResult<f64> {
        let z = params.margin(mean) / variance.sqrt();
        Ok(normal_cdf(z))
    }

    fn name(&self) -> &'static str {
        "probability_of_improvement"
    }
}

/// `(mean − best − xi)·Φ(z) + σ·φ(z)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedImprovement;

impl AcquisitionFunction for ExpectedImprovement {
    fn score(&self, mean: f64, variance: f64, params: &AcquisitionParams) -> BtResult<f64> {
        let sigma = variance.sqrt();
        let margin = params.margin(mean);
        let z = margin / sigma;
        Ok(margin * normal_cdf(z) + sigma * normal_pdf(z))
    }

    fn name(&self) -> &'static str {
        "expected_improvement"
    }
}

/// `mean + √variance·N(0, 1)`, drawn from the run-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThompsonSampling;

impl AcquisitionFunction for ThompsonSampling {
    fn score(&self, mean: f64, variance: f64, params: &AcquisitionParams) -> BtResult<f64> {
        let source = params
            .random_source
            .as_ref()
            .ok_or_else(|| AcquisitionError::MissingRandomSource {
                strategy: self.name().to_string(),
            })?;
        Ok(mean + variance.sqrt() * source.standard_normal())
    }

    fn name(&self) -> &'static str {
        "thompson_sampling"
    }
}

/// Serializable selector for the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionKind {
    #[default]
    Ucb,
    ProbabilityOfImprovement,
    ExpectedImprovement,
    ThompsonSampling,
}

impl AcquisitionKind {
    pub fn function(&self) -> &'static dyn AcquisitionFunction {
        match self {
            Self::Ucb => &UpperConfidenceBound,
            Self::ProbabilityOfImprovement => &ProbabilityOfImprovement,
            Self::ExpectedImprovement => &ExpectedImprovement,
            Self::ThompsonSampling => &ThompsonSampling,
        }
    }

    pub fn requires_random_source(&self) -> bool {
        matches!(self, Self::ThompsonSampling)
    }
}
