use super::special::student_t_two_sided;
use fastrand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PERMUTATIONS: usize = 10_000;
pub const PERMUTATION_SEED: u64 = 42;
pub const MIN_TREND_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// Two-sided OLS p-value for slope != 0.
    pub p_value: f64,
}

/// Ordinary least squares of `y` on `x`. None when fewer than two points or
/// when every `x` is equal.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = y_mean - slope * x_mean;
    let r = if ss_yy == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_xx * ss_yy).sqrt()).clamp(-1.0, 1.0)
    };

    let (std_err, p_value) = if n == 2 {
        (0.0, 0.0)
    } else {
        let df = nf - 2.0;
        let std_err = ((1.0 - r * r).max(0.0) * ss_yy / ss_xx / df).sqrt();
        // Keeps t finite for a perfect fit.
        const TINY: f64 = 1.0e-20;
        let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
        (std_err, student_t_two_sided(t, df))
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared: r * r,
        std_err,
        p_value,
    })
}

/// Slope-only OLS used inside the permutation loop.
#[inline(always)]
pub fn ols_slope(x: &[f64], y: &[f64], x_mean: f64, ss_xx: f64) -> f64 {
    let y_mean = y.iter().sum::<f64>() / y.len() as f64;
    let ss_xy: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi - x_mean) * (yi - y_mean))
        .sum();
    ss_xy / ss_xx
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub slope_b: f64,
    pub intercept_a: f64,
    pub r_squared: f64,
    pub p_ols: f64,
    pub p_permutation_one_sided: f64,
    pub std_err: f64,
    pub n_permutations: usize,
    pub n_points: usize,
    /// False when the fit was skipped for lack of lengths.
    pub sufficient_data: bool,
    pub interpretation: String,
}

impl TrendResult {
    fn insufficient(n_points: usize, reason: String) -> Self {
        Self {
            slope_b: 0.0,
            intercept_a: 0.0,
            r_squared: 0.0,
            p_ols: 1.0,
            p_permutation_one_sided: 1.0,
            std_err: 0.0,
            n_permutations: 0,
            n_points,
            sufficient_data: false,
            interpretation: reason,
        }
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.sufficient_data && self.p_permutation_one_sided < alpha
    }
}

/// Fits Δ(L) = a + b·L and tests H1: b > 0 by shuffling `deltas` against the
/// fixed `lengths`. The p-value is the fraction of permuted slopes at or
/// above the observed one.
pub fn trend_test(lengths: &[f64], deltas: &[f64], n_permutations: usize, seed: u64) -> TrendResult {
    let n = lengths.len().min(deltas.len());
    if n < MIN_TREND_POINTS {
        return TrendResult::insufficient(
            n,
            format!("Too few data points ({}) for trend test", n),
        );
    }
    let (x, y) = (&lengths[..n], &deltas[..n]);

    let fit = match linear_regression(x, y) {
        Some(fit) => fit,
        None => {
            return TrendResult::insufficient(
                n,
                "All lengths are identical; slope is undefined".to_string(),
            )
        }
    };

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let ss_xx: f64 = x.iter().map(|&xi| (xi - x_mean) * (xi - x_mean)).sum();
    let observed = ols_slope(x, y, x_mean, ss_xx);

    let mut rng = Rng::with_seed(seed);
    let mut permuted = y.to_vec();
    let mut count_ge = 0usize;
    for _ in 0..n_permutations {
        permuted.copy_from_slice(y);
        rng.shuffle(&mut permuted);
        if ols_slope(x, &permuted, x_mean, ss_xx) >= observed {
            count_ge += 1;
        }
    }
    let p_perm = if n_permutations > 0 {
        count_ge as f64 / n_permutations as f64
    } else {
        1.0
    };

    TrendResult {
        slope_b: fit.slope,
        intercept_a: fit.intercept,
        r_squared: fit.r_squared,
        p_ols: fit.p_value,
        p_permutation_one_sided: p_perm,
        std_err: fit.std_err,
        n_permutations,
        n_points: n,
        sufficient_data: true,
        interpretation: format!(
            "Δ(L) = {:.2} + {:.4}·L  (R²={:.3}, p_perm={:.4})",
            fit.intercept, fit.slope, fit.r_squared, p_perm
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ols_slope_matches_full_fit() {
        let x = [1.0, 2.0, 4.0, 7.0];
        let y = [3.0, 1.0, 6.0, 5.0];
        let fit = linear_regression(&x, &y).unwrap();
        let x_mean = 3.5;
        let ss_xx = 21.0;
        assert!((ols_slope(&x, &y, x_mean, ss_xx) - fit.slope).abs() < 1e-12);
    }

    #[test]
    fn test_constant_lengths_have_no_fit() {
        assert!(linear_regression(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
        let res = trend_test(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0], 100, 1);
        assert!(!res.sufficient_data);
        assert_eq!(res.p_permutation_one_sided, 1.0);
    }
}
