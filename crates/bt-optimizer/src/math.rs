//! Standard normal helpers used by acquisition scoring.

use libm::erfc;

const SQRT_2PI: f64 = 2.506_628_274_631_000_7;

/// Cumulative distribution function of Standard Normal at x
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Probability density function of Standard Normal at x
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn cdf_reference_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < EPS);
        assert!((normal_cdf(1.0) - 0.841_344_746_068_542_9).abs() < 1e-9);
        assert!((normal_cdf(-1.96) - 0.024_997_895_148_220_4).abs() < 1e-9);
        assert_eq!(normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(normal_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn cdf_is_symmetric() {
        for x in [0.1, 0.5, 1.3, 2.7, 4.0] {
            assert!((normal_cdf(x) + normal_cdf(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn pdf_reference_values() {
        assert!((normal_pdf(0.0) - 1.0 / (2.0 * std::f64::consts::PI).sqrt()).abs() < EPS);
        assert!((normal_pdf(1.0) - 0.241_970_724_519_143_37).abs() < 1e-12);
        assert_eq!(normal_pdf(2.0), normal_pdf(-2.0));
    }
}
