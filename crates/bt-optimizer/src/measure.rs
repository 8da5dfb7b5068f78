//! Objective evaluation: run the user's benchmark once and turn the outcome
//! into a cost.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::warn;

/// Base cost recorded for a failed evaluation; the elapsed nanoseconds are
/// added on top so a failure always ranks behind any success.
pub const FAILURE_PENALTY: f64 = f64::MAX / 2.0;

/// User-supplied benchmark whose wall-clock time is the cost.
///
/// Implemented for any `FnMut(&[T]) -> Result<(), E>` with a displayable
/// error. The benchmark must bound its own runtime.
pub trait Benchmark<T> {
    type Error: fmt::Display;

    fn run(&mut self, params: &[T]) -> Result<(), Self::Error>;
}

impl<T, E, F> Benchmark<T> for F
where
    F: FnMut(&[T]) -> Result<(), E>,
    E: fmt::Display,
{
    type Error = E;

    fn run(&mut self, params: &[T]) -> Result<(), E> {
        self(params)
    }
}

/// Anything that maps a point to a measured cost.
///
/// The optimizer only depends on this seam; [`Timed`] adapts a
/// [`Benchmark`] by timing it.
pub trait Objective<T> {
    fn evaluate(&mut self, params: &[T]) -> Measurement;
}

/// Outcome of one objective evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub cost: f64,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl Measurement {
    pub fn success(cost: f64, elapsed: Duration) -> Self {
        Self {
            cost,
            elapsed,
            error: None,
        }
    }

    /// A failed evaluation, penalized by [`FAILURE_PENALTY`] plus its duration.
    pub fn failure(elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            cost: FAILURE_PENALTY + elapsed.as_nanos() as f64,
            elapsed,
            error: Some(error.into()),
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Time exactly one invocation of `benchmark` with `params`.
pub fn measure<T, B>(benchmark: &mut B, params: &[T]) -> Measurement
where
    T: fmt::Debug,
    B: Benchmark<T> + ?Sized,
{
    let start = Instant::now();
    let result = benchmark.run(params);
    let elapsed = start.elapsed();

    match result {
        Ok(()) => Measurement::success(elapsed.as_nanos() as f64, elapsed),
        Err(e) => {
            warn!(params = ?params, elapsed_ns = elapsed.as_nanos() as u64, error = %e, "benchmark failed");
            Measurement::failure(elapsed, e.to_string())
        }
    }
}

/// Adapter that scores a [`Benchmark`] by its elapsed nanoseconds.
#[derive(Debug, Clone)]
pub struct Timed<B>(pub B);

impl<T, B> Objective<T> for Timed<B>
where
    T: fmt::Debug,
    B: Benchmark<T>,
{
    fn evaluate(&mut self, params: &[T]) -> Measurement {
        measure(&mut self.0, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn successful_run_costs_its_duration() {
        let mut calls = 0;
        let mut bench = |params: &[u32]| -> Result<(), String> {
            calls += 1;
            assert_eq!(params, &[3, 4]);
            thread::sleep(Duration::from_millis(2));
            Ok(())
        };
        let m = measure(&mut bench, &[3u32, 4]);
        assert_eq!(calls, 1);
        assert!(!m.failed());
        assert!(m.elapsed >= Duration::from_millis(2));
        assert_eq!(m.cost, m.elapsed.as_nanos() as f64);
    }

    #[test]
    fn failure_is_penalized() {
        let mut bench = |_: &[f64]| -> Result<(), String> { Err("out of memory".into()) };
        let m = measure(&mut bench, &[1.5f64]);
        assert!(m.failed());
        assert_eq!(m.error.as_deref(), Some("out of memory"));
        assert!(m.cost >= FAILURE_PENALTY);
        assert!(m.cost > Duration::from_secs(3600 * 24 * 365).as_nanos() as f64);
    }

    #[test]
    fn timed_adapter_delegates() {
        let mut objective = Timed(|params: &[i64]| -> Result<(), std::io::Error> {
            if params[0] < 0 {
                Err(std::io::Error::other("negative"))
            } else {
                Ok(())
            }
        });
        assert!(!objective.evaluate(&[1i64]).failed());
        assert!(objective.evaluate(&[-1i64]).failed());
    }

    #[test]
    fn explicit_measurements() {
        let ok = Measurement::success(12.0, Duration::from_nanos(12));
        assert_eq!(ok.cost, 12.0);
        let failed = Measurement::failure(Duration::from_nanos(5), "boom");
        assert_eq!(failed.cost, FAILURE_PENALTY + 5.0);
        assert!(failed.cost > ok.cost);
    }
}
