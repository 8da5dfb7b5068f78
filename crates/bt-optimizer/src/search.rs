//! Search space definitions and uniform sampling.

use bt_types::{validation_error, BtResult};
use num_traits::{NumCast, ToPrimitive};
use rand::distr::uniform::SampleUniform;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::random::RandomSource;

/// Whether a run searches over integers or reals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericKind {
    Integer,
    Continuous,
}

/// A numeric type usable as a search dimension.
///
/// Every dimension of one run shares the same type, so the sampling path
/// (integer or continuous) is fixed when the search space is declared.
pub trait Numeric:
    Copy + PartialOrd + fmt::Debug + fmt::Display + NumCast + SampleUniform + Send + Sync + 'static
{
    const KIND: NumericKind;

    /// Value as the surrogate's feature representation.
    fn to_feature(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Whether `[min, max]` can be sampled uniformly in this type.
    fn span_is_sampleable(_min: Self, _max: Self) -> bool {
        true
    }

    /// Uniform draw over the inclusive interval `[min, max]`.
    ///
    /// Panics if the range does not pass [`SearchSpace::validate`].
    fn sample_inclusive<R: Rng>(rng: &mut R, min: Self, max: Self) -> Self {
        rng.random_range(min..=max)
    }
}

macro_rules! impl_numeric {
    (integer => $($t:ty),+) => {
        $(impl Numeric for $t {
            const KIND: NumericKind = NumericKind::Integer;
        })+
    };
    (float => $($t:ty),+) => {
        $(impl Numeric for $t {
            const KIND: NumericKind = NumericKind::Continuous;

            // Same scale the uniform float sampler derives from the bounds.
            fn span_is_sampleable(min: Self, max: Self) -> bool {
                ((max - min) / (1.0 - <$t>::EPSILON)).is_finite()
            }
        })+
    };
}

impl_numeric!(integer => i32, i64, u32, u64, usize);
impl_numeric!(float => f32, f64);

/// Inclusive bounds for one search dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: Numeric> ParameterRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, index: usize) -> BtResult<()> {
        if T::KIND == NumericKind::Continuous
            && !(self.min.to_feature().is_finite() && self.max.to_feature().is_finite())
        {
            return Err(validation_error!(
                "dimension {index}: bounds [{}, {}] must be finite",
                self.min,
                self.max
            ));
        }
        // Also rejects NaN bounds, which compare false both ways.
        if !(self.min <= self.max) {
            return Err(validation_error!(
                "dimension {index}: min {} is greater than max {}",
                self.min,
                self.max
            ));
        }
        if !T::span_is_sampleable(self.min, self.max) {
            return Err(validation_error!(
                "dimension {index}: span of [{}, {}] overflows",
                self.min,
                self.max
            ));
        }
        Ok(())
    }
}

impl<T: Numeric> From<(T, T)> for ParameterRange<T> {
    fn from((min, max): (T, T)) -> Self {
        Self::new(min, max)
    }
}

/// The full search space: an ordered list of dimensions of one numeric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace<T> {
    pub ranges: Vec<ParameterRange<T>>,
}

impl<T: Numeric> SearchSpace<T> {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn from_ranges(ranges: impl IntoIterator<Item = ParameterRange<T>>) -> Self {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }

    pub fn add_range(mut self, min: T, max: T) -> Self {
        self.ranges.push(ParameterRange::new(min, max));
        self
    }

    pub fn dimensions(&self) -> usize {
        self.ranges.len()
    }

    pub fn kind(&self) -> NumericKind {
        T::KIND
    }

    /// Reject empty spaces, inverted bounds, non-finite continuous bounds and
    /// continuous spans too wide to sample.
    pub fn validate(&self) -> BtResult<()> {
        if self.ranges.is_empty() {
            return Err(validation_error!("search space has no dimensions"));
        }
        for (index, range) in self.ranges.iter().enumerate() {
            range.validate(index)?;
        }
        Ok(())
    }

    /// Whether `point` has one in-range value per dimension.
    pub fn contains(&self, point: &[T]) -> bool {
        point.len() == self.ranges.len()
            && self
                .ranges
                .iter()
                .zip(point)
                .all(|(range, value)| range.contains(*value))
    }

    /// The lower corner of the space.
    pub fn minimums(&self) -> Vec<T> {
        self.ranges.iter().map(|r| r.min).collect()
    }

    /// Draw one point uniformly, holding the source's lock for the whole point.
    pub fn sample(&self, source: &RandomSource) -> Vec<T> {
        source.with_rng(|rng| {
            self.ranges
                .iter()
                .map(|range| T::sample_inclusive(rng, range.min, range.max))
                .collect()
        })
    }
}

impl<T: Numeric> Default for SearchSpace<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a point into the surrogate's `f64` feature vector.
pub fn to_features<T: Numeric>(point: &[T]) -> Vec<f64> {
    point.iter().map(|v| v.to_feature()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::BtError;

    #[test]
    fn integer_sampling_respects_inclusive_bounds() {
        let space = SearchSpace::new().add_range(1i64, 3).add_range(-5, 5);
        let source = RandomSource::from_seed(42);

        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..500 {
            let point = space.sample(&source);
            assert_eq!(point.len(), 2);
            assert!(space.contains(&point), "out of bounds: {point:?}");
            seen_low |= point[0] == 1;
            seen_high |= point[0] == 3;
        }
        assert!(seen_low && seen_high, "both endpoints should be reachable");
    }

    #[test]
    fn continuous_sampling_respects_bounds() {
        let space = SearchSpace::new().add_range(0.5f64, 1.0).add_range(-1e3, 1e3);
        let source = RandomSource::from_seed(1);
        for _ in 0..200 {
            let point = space.sample(&source);
            assert!(space.contains(&point), "out of bounds: {point:?}");
        }
    }

    #[test]
    fn degenerate_range_always_yields_its_bound() {
        let space = SearchSpace::new().add_range(7u32, 7);
        let source = RandomSource::from_seed(9);
        assert_eq!(space.sample(&source), vec![7]);
    }

    #[test]
    fn same_seed_same_points() {
        let space = SearchSpace::new().add_range(0.0f32, 10.0).add_range(1.0, 2.0);
        let a = RandomSource::from_seed(5);
        let b = RandomSource::from_seed(5);
        for _ in 0..20 {
            assert_eq!(space.sample(&a), space.sample(&b));
        }
    }

    #[test]
    fn validation_rejects_inverted_bounds() {
        let space = SearchSpace::new().add_range(1i32, 10).add_range(9, 3);
        match space.validate() {
            Err(BtError::Validation(msg)) => {
                assert!(msg.contains("dimension 1"), "unexpected message: {msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_empty_and_non_finite_spaces() {
        assert!(SearchSpace::<i32>::new().validate().is_err());
        assert!(SearchSpace::new().add_range(0.0, f64::INFINITY).validate().is_err());
        assert!(SearchSpace::new().add_range(f64::NAN, 1.0).validate().is_err());
        assert!(SearchSpace::new().add_range(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn validation_rejects_overflowing_spans() {
        let wide = SearchSpace::new().add_range(-1e308f64, 1e308);
        match wide.validate() {
            Err(BtError::Validation(msg)) => {
                assert!(msg.contains("overflows"), "unexpected message: {msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(SearchSpace::new().add_range(f64::MIN, f64::MAX).validate().is_err());
        assert!(SearchSpace::new().add_range(-3e38f32, 3e38).validate().is_err());

        let space = SearchSpace::new().add_range(-1e307f64, 1e307);
        assert!(space.validate().is_ok());
        let source = RandomSource::from_seed(1);
        for _ in 0..50 {
            assert!(space.contains(&space.sample(&source)));
        }
    }

    #[test]
    fn kinds_and_features() {
        assert_eq!(SearchSpace::<usize>::new().kind(), NumericKind::Integer);
        assert_eq!(SearchSpace::<f32>::new().kind(), NumericKind::Continuous);
        assert_eq!(to_features(&[3u64, 4]), vec![3.0, 4.0]);
        assert_eq!(to_features(&[2.5f32]), vec![2.5]);
    }

    #[test]
    fn space_from_tuples() {
        let space = SearchSpace::<i32>::from_ranges([(1, 100).into(), (1, 3).into()]);
        assert_eq!(space.dimensions(), 2);
        assert_eq!(space.minimums(), vec![1, 1]);
        assert!(!space.contains(&[1]));
    }
}
