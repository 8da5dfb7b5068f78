//! Kernel-weighted surrogate model over past (point, cost) observations.
//!
//! The estimator is intentionally simpler than a full Gaussian-process
//! posterior: there is no kernel-matrix inversion, and both moments are
//! normalized by the raw observation count rather than by the summed kernel
//! weights. For `n` observations and weights `kᵢ = k(x, xᵢ)`:
//!
//! ```text
//! mean     = Σ kᵢ·yᵢ / n
//! variance = 1 − Σᵢ Σⱼ kᵢ·kⱼ / n
//! ```
//!
//! The variance is not clamped and goes negative once enough strongly
//! correlated observations accumulate.

use parking_lot::RwLock;

/// Initial RBF kernel width.
pub const DEFAULT_KERNEL_WIDTH: f64 = 1.0;

#[derive(Debug, Clone)]
struct GpState {
    inputs: Vec<Vec<f64>>,
    costs: Vec<f64>,
    sigma: f64,
}

/// Thread-safe surrogate model.
///
/// `predict` and `kernel` take the read lock so predictions can run
/// concurrently; `update` and `set_kernel_width` take the write lock.
#[derive(Debug)]
pub struct GaussianProcess {
    state: RwLock<GpState>,
}

/// RBF kernel. Panics if `a` and `b` differ in length.
fn rbf(a: &[f64], b: &[f64], sigma: f64) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "kernel inputs must have the same dimensionality"
    );
    let squared_distance: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum();
    (-squared_distance / (2.0 * sigma * sigma)).exp()
}

impl GaussianProcess {
    pub fn new() -> Self {
        Self::with_kernel_width(DEFAULT_KERNEL_WIDTH)
    }

    pub fn with_kernel_width(sigma: f64) -> Self {
        Self {
            state: RwLock::new(GpState {
                inputs: Vec::new(),
                costs: Vec::new(),
                sigma,
            }),
        }
    }

    /// Similarity of two points in `(0, 1]`; exactly 1 for identical points.
    ///
    /// # Panics
    ///
    /// If `a` and `b` have different lengths.
    pub fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let sigma = self.state.read().sigma;
        rbf(a, b, sigma)
    }

    /// Predicted `(mean, variance)` of the cost at `x`.
    ///
    /// Returns the uninformative prior `(0, 1)` before any observation.
    ///
    /// # Panics
    ///
    /// If `x` does not match the dimensionality of recorded observations.
    pub fn predict(&self, x: &[f64]) -> (f64, f64) {
        let state = self.state.read();
        if state.inputs.is_empty() {
            return (0.0, 1.0);
        }

        let n = state.inputs.len() as f64;
        let weights: Vec<f64> = state
            .inputs
            .iter()
            .map(|xi| rbf(x, xi, state.sigma))
            .collect();

        let mean = weights
            .iter()
            .zip(&state.costs)
            .map(|(k, y)| k * y)
            .sum::<f64>()
            / n;

        let mut variance = 1.0;
        for ki in &weights {
            for kj in &weights {
                variance -= ki * kj / n;
            }
        }

        (mean, variance)
    }

    /// Record an observation. The model keeps its own copy of `x`.
    ///
    /// # Panics
    ///
    /// If `x` does not match the dimensionality of earlier observations.
    pub fn update(&self, x: &[f64], y: f64) {
        let mut state = self.state.write();
        if let Some(first) = state.inputs.first() {
            assert_eq!(
                first.len(),
                x.len(),
                "observation dimensionality changed mid-run"
            );
        }
        state.inputs.push(x.to_vec());
        state.costs.push(y);
    }

    pub fn kernel_width(&self) -> f64 {
        self.state.read().sigma
    }

    pub fn set_kernel_width(&self, sigma: f64) {
        self.state.write().sigma = sigma;
    }

    /// Number of recorded observations.
    pub fn len(&self) -> usize {
        self.state.read().inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality fixed by the first observation.
    pub fn dimensions(&self) -> Option<usize> {
        self.state.read().inputs.first().map(Vec::len)
    }

    /// Copy of the observation history in insertion order.
    pub fn observations(&self) -> Vec<(Vec<f64>, f64)> {
        let state = self.state.read();
        state
            .inputs
            .iter()
            .cloned()
            .zip(state.costs.iter().copied())
            .collect()
    }
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self::new()
    }
}
