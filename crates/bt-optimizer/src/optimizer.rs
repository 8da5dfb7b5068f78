//! Sequential Bayesian optimization driver.
//!
//! A run goes through two phases in order and never returns to the first:
//!
//! 1. **Initial sampling**: `initial_samples` uniformly random points are
//!    evaluated to seed the surrogate.
//! 2. **Optimization**: each of `iterations` rounds draws `num_candidates`
//!    random points, scores them with the acquisition function over the
//!    surrogate's prediction, and evaluates only the lowest-scoring one.
//!
//! Every evaluation is recorded in the surrogate in completion order, offered
//! to the best-so-far cell, and reported on the progress channel if one is
//! configured.

use bt_types::{config_error, BtResult, Phase, ProgressEvent, RunId};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::acquisition::{AcquisitionFunction, AcquisitionParams};
use crate::gp::GaussianProcess;
use crate::measure::{Benchmark, Measurement, Objective, Timed};
use crate::random::RandomSource;
use crate::search::{to_features, Numeric, ParameterRange, SearchSpace};
use crate::trial::{BestState, OptimizationOutcome, RunConfig, TrialRecord};

/// One optimization run over a fixed search space.
///
/// The surrogate, best-state cell and sampling source are created with the
/// optimizer and consumed by [`Optimizer::run`], so nothing leaks between
/// runs.
#[derive(Debug)]
pub struct Optimizer<T: Numeric> {
    run_id: RunId,
    config: RunConfig,
    space: SearchSpace<T>,
    surrogate: GaussianProcess,
    best: BestState<T>,
    sampler: RandomSource,
}

impl<T: Numeric> Optimizer<T> {
    /// Validate `config` and `space` and prepare a fresh run.
    ///
    /// The acquisition random source is forked, so runs built from clones of
    /// one config never draw from the same generator.
    pub fn new(mut config: RunConfig, space: SearchSpace<T>) -> BtResult<Self> {
        config.validate()?;
        space.validate()?;
        config.acq_params.random_source = config
            .acq_params
            .random_source
            .as_ref()
            .map(RandomSource::fork);

        let sampler = match config.seed {
            Some(seed) => RandomSource::from_seed(seed),
            None => RandomSource::from_entropy(),
        };
        let surrogate = GaussianProcess::with_kernel_width(config.kernel_width);
        let best = BestState::new(space.minimums());

        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            space,
            surrogate,
            best,
            sampler,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn space(&self) -> &SearchSpace<T> {
        &self.space
    }

    /// Time `benchmark` at each chosen point and minimize its elapsed time.
    pub fn run_benchmark<B: Benchmark<T>>(self, benchmark: B) -> BtResult<OptimizationOutcome<T>> {
        self.run(&mut Timed(benchmark))
    }

    /// Execute both phases against `objective`.
    pub fn run<O: Objective<T> + ?Sized>(
        self,
        objective: &mut O,
    ) -> BtResult<OptimizationOutcome<T>> {
        let started_at = Utc::now();
        let acquisition = self.config.acquisition_function();
        let mut acq_params = self.config.acq_params.clone();

        info!(
            run_id = %self.run_id,
            dimensions = self.space.dimensions(),
            kind = ?self.space.kind(),
            initial_samples = self.config.initial_samples,
            iterations = self.config.iterations,
            num_candidates = self.config.num_candidates,
            acquisition = acquisition.name(),
            kernel_width = self.config.kernel_width,
            "starting optimization run"
        );

        let mut trials = Vec::with_capacity(self.config.total_evaluations());

        for i in 0..self.config.initial_samples {
            let params = self.space.sample(&self.sampler);
            let measurement = objective.evaluate(&params);
            trials.push(self.record(
                Phase::InitialSampling,
                i + 1,
                self.config.initial_samples,
                trials.len() + 1,
                params,
                measurement,
                None,
            ));
        }

        for i in 0..self.config.iterations {
            acq_params.best_so_far = self.best.best_cost();
            let (params, score) = self.select_candidate(acquisition, &acq_params)?;
            let measurement = objective.evaluate(&params);
            trials.push(self.record(
                Phase::Optimization,
                i + 1,
                self.config.iterations,
                trials.len() + 1,
                params,
                measurement,
                Some(score),
            ));
        }

        let dropped_events = self
            .config
            .progress
            .as_ref()
            .map_or(0, |sink| sink.dropped());
        let (best_params, best_cost) = self.best.into_inner();

        info!(
            run_id = %self.run_id,
            best_cost,
            best_params = ?best_params,
            evaluations = trials.len(),
            failed = trials.iter().filter(|t| t.failed()).count(),
            dropped_events,
            "optimization run finished"
        );

        Ok(OptimizationOutcome {
            run_id: self.run_id,
            best_params,
            best_cost,
            trials,
            dropped_events,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Draw candidates and keep the one with the lowest acquisition score.
    ///
    /// Ties go to the earliest candidate. A NaN score never beats a real one.
    fn select_candidate(
        &self,
        acquisition: &dyn AcquisitionFunction,
        params: &AcquisitionParams,
    ) -> BtResult<(Vec<T>, f64)> {
        let mut selected: Option<(Vec<T>, f64)> = None;

        for _ in 0..self.config.num_candidates {
            let candidate = self.space.sample(&self.sampler);
            let (mean, variance) = self.surrogate.predict(&to_features(&candidate));
            let score = acquisition.score(mean, variance, params)?;

            let better = match &selected {
                None => true,
                Some((_, current)) => score < *current || (current.is_nan() && !score.is_nan()),
            };
            if better {
                selected = Some((candidate, score));
            }
        }

        selected.ok_or_else(|| config_error!("no candidates to choose from"))
    }

    /// Apply one finished evaluation to the surrogate, best state and
    /// progress channel.
    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        phase: Phase,
        iteration: usize,
        total: usize,
        number: usize,
        params: Vec<T>,
        measurement: Measurement,
        acquisition_score: Option<f64>,
    ) -> TrialRecord<T> {
        self.surrogate.update(&to_features(&params), measurement.cost);
        let improved = self.best.offer(&params, measurement.cost);

        debug!(
            run_id = %self.run_id,
            phase = %phase,
            iteration,
            total,
            params = ?params,
            cost = measurement.cost,
            acquisition_score = ?acquisition_score,
            improved,
            "trial evaluated"
        );

        self.emit(phase, iteration, total, &params, measurement.cost, improved);

        TrialRecord {
            number,
            phase,
            params,
            cost: measurement.cost,
            elapsed: measurement.elapsed,
            error: measurement.error,
            acquisition_score,
        }
    }

    fn emit(
        &self,
        phase: Phase,
        iteration: usize,
        total: usize,
        params: &[T],
        cost: f64,
        improved: bool,
    ) {
        let Some(sink) = &self.config.progress else {
            return;
        };
        let (best_params, best_cost) = self.best.snapshot();
        sink.publish(ProgressEvent {
            run_id: self.run_id,
            phase,
            current_iteration: iteration,
            total_iterations: total,
            current_params: to_features(params),
            best_params_so_far: to_features(&best_params),
            best_cost_so_far: best_cost,
            last_cost: cost,
            improved,
            timestamp: Utc::now(),
        });
    }
}

/// Run a timed optimization and return the best parameters found.
///
/// The returned vector has one value per range, in the order given.
pub fn optimize<T, B, R>(config: RunConfig, benchmark: B, ranges: R) -> BtResult<Vec<T>>
where
    T: Numeric,
    B: Benchmark<T>,
    R: IntoIterator<Item = ParameterRange<T>>,
{
    let space = SearchSpace::from_ranges(ranges);
    let outcome = Optimizer::new(config, space)?.run_benchmark(benchmark)?;
    Ok(outcome.best_params)
}
