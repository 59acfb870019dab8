//! Distribution functions for the post-hoc procedures.
//!
//! The Student t tail comes from `statrs`. The studentized range and the
//! Dunnett (equicorrelated-product multivariate t) distributions are computed
//! by composite Simpson integration: an inner integral over a standard normal
//! and an outer integral over `s = S/sigma`, which follows a scaled chi
//! distribution with `df` degrees of freedom. The outer integral runs over
//! `ln s` so that the mass near zero at very small `df` is resolved. All grids
//! are fixed, so every result is deterministic.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;

use crate::error::AnalysisError;

/// Half-width of the standard normal integration range
const Z_LIMIT: f64 = 8.0;
/// Simpson intervals over the normal variable
const Z_INTERVALS: usize = 160;
/// Simpson intervals over the log of the chi variable
const S_INTERVALS: usize = 120;
/// `P(s < exp(-LOG_TAIL / df))` is negligible for every df
const LOG_TAIL: f64 = 20.0;
/// Above this many degrees of freedom `s` is treated as exactly 1
const LARGE_DF: f64 = 2000.0;

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

fn normal_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Composite Simpson rule over `[a, b]` with `intervals` (rounded up to even)
pub(crate) fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, intervals: usize) -> f64 {
    let n = if intervals % 2 == 0 { intervals } else { intervals + 1 }.max(2);
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + i as f64 * h);
    }
    sum * h / 3.0
}

/// Density of `s = sqrt(chi2_df / df)`
struct ScaledChi {
    df: f64,
    log_norm: f64,
}

impl ScaledChi {
    fn new(df: f64) -> Self {
        let log_norm = 0.5 * df * df.ln() - ln_gamma(0.5 * df) - (0.5 * df - 1.0) * 2f64.ln();
        Self { df, log_norm }
    }

    fn pdf(&self, s: f64) -> f64 {
        if s <= 0.0 {
            return 0.0;
        }
        (self.log_norm + (self.df - 1.0) * s.ln() - 0.5 * self.df * s * s).exp()
    }

    /// Bounds on `ln s` holding all but a negligible tail of the mass
    fn log_bounds(&self) -> (f64, f64) {
        let width = 8.0 / (2.0 * self.df).sqrt();
        let lo = (1.0 - width).max((-LOG_TAIL / self.df).exp());
        (lo.ln(), (1.0 + width).ln())
    }

    /// E[g(s)] for a function of the scale variable
    fn expect<F: Fn(f64) -> f64>(&self, g: F) -> f64 {
        if self.df > LARGE_DF {
            return g(1.0);
        }
        let (lo, hi) = self.log_bounds();
        simpson(
            |u| {
                let s = u.exp();
                self.pdf(s) * s * g(s)
            },
            lo,
            hi,
            S_INTERVALS,
        )
    }
}

fn check_df(df: f64) -> Result<(), AnalysisError> {
    if !(df >= 1.0) {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least 1 residual degree of freedom, got {}",
            df
        )));
    }
    Ok(())
}

/// Two-sided p-value of a Student t statistic
pub fn student_t_two_sided(t: f64, df: f64) -> Result<f64, AnalysisError> {
    check_df(df)?;
    if t.is_nan() {
        return Err(AnalysisError::Computation("t statistic is NaN".to_string()));
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalysisError::Computation(format!("Student t distribution: {}", e)))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// P(range of `k` iid standard normals < w)
fn normal_range_cdf(w: f64, k: usize) -> f64 {
    if w <= 0.0 {
        return 0.0;
    }
    let exponent = (k - 1) as i32;
    let integrand = |z: f64| {
        let inner = (normal_cdf(z + w) - normal_cdf(z)).max(0.0);
        normal_pdf(z) * inner.powi(exponent)
    };
    (k as f64 * simpson(integrand, -Z_LIMIT, Z_LIMIT, Z_INTERVALS)).min(1.0)
}

/// CDF of the studentized range distribution with `k` means and `df` degrees of freedom
pub fn studentized_range_cdf(q: f64, k: usize, df: f64) -> Result<f64, AnalysisError> {
    check_df(df)?;
    if k < 2 {
        return Err(AnalysisError::InsufficientData(
            "studentized range needs at least 2 groups".to_string(),
        ));
    }
    if q <= 0.0 {
        return Ok(0.0);
    }
    if q.is_infinite() {
        return Ok(1.0);
    }
    let chi = ScaledChi::new(df);
    Ok(chi.expect(|s| normal_range_cdf(q * s, k)).clamp(0.0, 1.0))
}

/// Quantile of the studentized range distribution, by bisection
pub fn studentized_range_quantile(p: f64, k: usize, df: f64) -> Result<f64, AnalysisError> {
    if !(0.0..1.0).contains(&p) {
        return Err(AnalysisError::Computation(format!(
            "quantile probability must be in [0, 1), got {}",
            p
        )));
    }
    let mut lo = 0.0;
    let mut hi = 1.0;
    while studentized_range_cdf(hi, k, df)? < p {
        lo = hi;
        hi *= 2.0;
        if hi > 1e6 {
            return Err(AnalysisError::Computation(
                "studentized range quantile did not converge".to_string(),
            ));
        }
    }
    for _ in 0..50 {
        let mid = 0.5 * (lo + hi);
        if studentized_range_cdf(mid, k, df)? < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// P(max_i |T_i| < c) for the Dunnett statistics.
///
/// `lambdas[i] = sqrt(n_i / (n_i + n_control))`; the correlation between
/// `T_i` and `T_j` is `lambdas[i] * lambdas[j]`, which lets the joint
/// probability factor given a shared standard normal.
pub fn dunnett_cdf(c: f64, lambdas: &[f64], df: f64) -> Result<f64, AnalysisError> {
    check_df(df)?;
    if lambdas.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "Dunnett distribution needs at least one comparison".to_string(),
        ));
    }
    if c <= 0.0 {
        return Ok(0.0);
    }
    if c.is_infinite() {
        return Ok(1.0);
    }

    let spreads: Vec<f64> = lambdas.iter().map(|l| (1.0 - l * l).sqrt()).collect();
    let joint = |bound: f64| {
        let integrand = |z: f64| {
            let mut prob = normal_pdf(z);
            for (lambda, spread) in lambdas.iter().zip(&spreads) {
                let upper = normal_cdf((bound - lambda * z) / spread);
                let lower = normal_cdf((-bound - lambda * z) / spread);
                prob *= (upper - lower).max(0.0);
            }
            prob
        };
        simpson(integrand, -Z_LIMIT, Z_LIMIT, Z_INTERVALS)
    };

    let chi = ScaledChi::new(df);
    Ok(chi.expect(|s| joint(c * s)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((normal_cdf(1.959_963_985) - 0.975).abs() < 1e-9);
    }

    #[test]
    fn test_simpson_polynomial() {
        // exact for cubics
        let area = simpson(|x| x * x * x + x, 0.0, 2.0, 4);
        assert!((area - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_student_t_two_sided() {
        let p = student_t_two_sided(3.0 / (2.0f64 / 3.0).sqrt(), 4.0).unwrap();
        assert!((p - 0.021_312).abs() < 1e-4);
        assert!((student_t_two_sided(0.0, 4.0).unwrap() - 1.0).abs() < 1e-12);
        assert!(student_t_two_sided(1.0, 0.0).is_err());
    }

    #[test]
    fn test_studentized_range_quantiles() {
        // published table values
        let cases = [
            (3, 10.0, 3.877),
            (3, 6.0, 4.339),
            (5, 20.0, 4.232),
            (2, 2.0, 6.085),
            (2, 1e9, 2.772),
        ];
        for (k, df, expected) in cases {
            let q = studentized_range_quantile(0.95, k, df).unwrap();
            assert!(
                (q - expected).abs() < 2e-3,
                "q(0.95; {}, {}) = {}, expected {}",
                k,
                df,
                q,
                expected
            );
        }
    }

    #[test]
    fn test_studentized_range_quantiles_single_df() {
        // df = 1 table values (26.98, 49.07 and 17.97 to two decimals)
        let cases = [(3, 26.976), (10, 49.071), (2, 17.969)];
        for (k, expected) in cases {
            let q = studentized_range_quantile(0.95, k, 1.0).unwrap();
            assert!(
                (q - expected).abs() < 1e-2,
                "q(0.95; {}, 1) = {}, expected {}",
                k,
                q,
                expected
            );
        }
    }

    #[test]
    fn test_studentized_range_two_groups_matches_t() {
        // with k = 2, Q = sqrt(2) |T|
        let t = 2.447;
        let p_range = 1.0 - studentized_range_cdf(t * 2f64.sqrt(), 2, 6.0).unwrap();
        let p_t = student_t_two_sided(t, 6.0).unwrap();
        assert!((p_range - p_t).abs() < 1e-4);
    }

    #[test]
    fn test_dunnett_critical_values() {
        let lambda = 0.5f64.sqrt();
        // two treatments vs control, df = 6: two-sided 5% critical value 2.86
        let cdf = dunnett_cdf(2.863, &[lambda, lambda], 6.0).unwrap();
        assert!((cdf - 0.95).abs() < 1e-3);
        // four treatments, df = 20: 2.65
        let cdf = dunnett_cdf(2.651, &[lambda; 4], 20.0).unwrap();
        assert!((cdf - 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_dunnett_single_comparison_is_t_test() {
        let lambda = 0.5f64.sqrt();
        let p = 1.0 - dunnett_cdf(2.447, &[lambda], 6.0).unwrap();
        assert!((p - 0.05).abs() < 1e-3);
        // t(0.975; 1) = 12.706
        let p = 1.0 - dunnett_cdf(12.706, &[lambda], 1.0).unwrap();
        assert!((p - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(dunnett_cdf(0.0, &[0.5], 4.0).unwrap(), 0.0);
        assert_eq!(studentized_range_cdf(0.0, 3, 4.0).unwrap(), 0.0);
        assert!(studentized_range_cdf(1.0, 1, 4.0).is_err());
        assert!(dunnett_cdf(1.0, &[], 4.0).is_err());
    }
}
