pub mod rank;
pub mod special;
pub mod trend;

pub use self::rank::{mann_whitney_greater, RankSumTest};
pub use self::trend::{
    linear_regression, trend_test, LinearFit, TrendResult, DEFAULT_PERMUTATIONS,
    MIN_TREND_POINTS, PERMUTATION_SEED,
};

use serde::{Deserialize, Serialize};

/// z for a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased (n - 1) sample variance; 0 below two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Wilson score interval for `successes / n`, clamped to [0, 1].
/// `(0, 0)` when `n == 0`.
pub fn wilson_ci(successes: usize, n: usize, z: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }
    let nf = n as f64;
    let p_hat = (successes as f64 / nf).clamp(0.0, 1.0);
    let z2 = z * z;
    let denom = 1.0 + z2 / nf;
    let center = (p_hat + z2 / (2.0 * nf)) / denom;
    let margin = z * ((p_hat * (1.0 - p_hat) + z2 / (4.0 * nf)) / nf).sqrt() / denom;
    ((center - margin).max(0.0), (center + margin).min(1.0))
}

/// Standardized mean difference `(mean(group2) - mean(group1)) / pooled_sd`.
///
/// Returns 0 whenever the pooled SD is zero or undefined (an empty group, or
/// two groups with a single value each).
pub fn cohens_d(group1: &[f64], group2: &[f64]) -> f64 {
    let n1 = group1.len();
    let n2 = group2.len();
    if n1 == 0 || n2 == 0 || n1 + n2 <= 2 {
        return 0.0;
    }
    let ss1 = sample_variance(group1) * n1.saturating_sub(1) as f64;
    let ss2 = sample_variance(group2) * n2.saturating_sub(1) as f64;
    let pooled_sd = ((ss1 + ss2) / (n1 + n2 - 2) as f64).sqrt();
    if pooled_sd == 0.0 || !pooled_sd.is_finite() {
        return 0.0;
    }
    (mean(group2) - mean(group1)) / pooled_sd
}

/// One trial as seen by the statistics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub energy: f64,
    pub success: bool,
    pub runtime_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    pub n: usize,
    pub successes: usize,
    /// Fraction in [0, 1].
    pub rate: f64,
    pub ci_95: (f64, f64),
    pub mean_energy: f64,
    pub std_energy: f64,
    pub mean_runtime_ms: f64,
}

impl ArmSummary {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let n = outcomes.len();
        let successes = outcomes.iter().filter(|o| o.success).count();
        let energies: Vec<f64> = outcomes.iter().map(|o| o.energy).collect();
        let runtimes: Vec<f64> = outcomes.iter().map(|o| o.runtime_ms).collect();

        Self {
            n,
            successes,
            rate: if n > 0 { successes as f64 / n as f64 } else { 0.0 },
            ci_95: wilson_ci(successes, n, Z_95),
            mean_energy: mean(&energies),
            std_energy: sample_std(&energies),
            mean_runtime_ms: mean(&runtimes),
        }
    }
}

/// Head-to-head comparison of a baseline arm and a challenger arm at one length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthSummary {
    pub length: usize,
    pub baseline: ArmSummary,
    pub challenger: ArmSummary,
    /// challenger rate - baseline rate (fraction).
    pub delta: f64,
    /// challenger rate / baseline rate; None when the baseline never succeeds.
    pub ratio: Option<f64>,
    /// Positive when the challenger's energies are higher on average.
    pub cohens_d: f64,
    pub mann_whitney_u: f64,
    /// One-sided: baseline energies stochastically greater (worse).
    pub mann_whitney_p: f64,
}

pub fn summarize_length(length: usize, baseline: &[Outcome], challenger: &[Outcome]) -> LengthSummary {
    let base = ArmSummary::from_outcomes(baseline);
    let chal = ArmSummary::from_outcomes(challenger);

    let base_e: Vec<f64> = baseline.iter().map(|o| o.energy).collect();
    let chal_e: Vec<f64> = challenger.iter().map(|o| o.energy).collect();
    let rank = mann_whitney_greater(&base_e, &chal_e);

    let ratio = if base.rate > 0.0 {
        Some(chal.rate / base.rate)
    } else {
        None
    };

    LengthSummary {
        length,
        delta: chal.rate - base.rate,
        ratio,
        cohens_d: cohens_d(&base_e, &chal_e),
        mann_whitney_u: rank.u_statistic,
        mann_whitney_p: rank.p_value,
        baseline: base,
        challenger: chal,
    }
}
