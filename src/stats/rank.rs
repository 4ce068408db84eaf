use super::special::normal_sf;
use serde::{Deserialize, Serialize};

/// Largest smaller-sample size for which the exact null is used.
const EXACT_MAX_SMALL_SAMPLE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSumTest {
    /// Mann-Whitney U of the first sample.
    pub u_statistic: f64,
    /// One-sided p-value for "first sample is stochastically greater".
    pub p_value: f64,
    pub exact: bool,
}

impl RankSumTest {
    fn neutral() -> Self {
        Self {
            u_statistic: 0.0,
            p_value: 1.0,
            exact: false,
        }
    }
}

/// Mann-Whitney U test with alternative "x > y".
///
/// Exact null distribution when the smaller sample has at most 8 values and
/// nothing is tied; otherwise the normal approximation with tie correction
/// and continuity correction. Empty input gives `p = 1`.
pub fn mann_whitney_greater(x: &[f64], y: &[f64]) -> RankSumTest {
    let n1 = x.len();
    let n2 = y.len();
    if n1 == 0 || n2 == 0 {
        return RankSumTest::neutral();
    }

    let (ranks, tie_term) = average_ranks(x, y);
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;

    if n1.min(n2) <= EXACT_MAX_SMALL_SAMPLE && tie_term == 0.0 {
        return RankSumTest {
            u_statistic: u1,
            p_value: exact_upper_tail(u1.round() as usize, n1, n2),
            exact: true,
        };
    }

    let n = (n1 + n2) as f64;
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let mu = n1f * n2f / 2.0;
    let var = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    let p_value = if var > 0.0 {
        normal_sf((u1 - mu - 0.5) / var.sqrt())
    } else {
        1.0
    };

    RankSumTest {
        u_statistic: u1,
        p_value,
        exact: false,
    }
}

/// Ranks of `x` then `y` in the pooled sample (ties share the average rank),
/// plus Σ(t³ - t) over tie groups.
fn average_ranks(x: &[f64], y: &[f64]) -> (Vec<f64>, f64) {
    let mut pooled: Vec<(f64, usize)> = x.iter().chain(y.iter()).copied().zip(0..).collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; pooled.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // 1-based ranks start+1 ..= end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &(_, idx) in &pooled[start..end] {
            ranks[idx] = avg;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

/// P(U >= u) under H0 for sample sizes (n1, n2), no ties.
///
/// The U counts are the coefficients of the Gaussian binomial
/// [n1 + n2 choose m]_q with m = min(n1, n2), built as
/// Π_{i=1..m} (1 - q^(n+i)) / (1 - q^i). Counts are kept as exact integers;
/// only when they would overflow does this drop to floating point, floored
/// at the single most extreme arrangement.
fn exact_upper_tail(u: usize, n1: usize, n2: usize) -> f64 {
    let m = n1.min(n2);
    let n = n1.max(n2);
    if u > m * n {
        return 0.0;
    }

    let exact = rank_sum_counts(m, n).and_then(|counts| {
        let total = counts.iter().try_fold(0u128, |acc, &c| acc.checked_add(c))?;
        let tail: u128 = counts[u..].iter().sum();
        Some(tail as f64 / total as f64)
    });

    match exact {
        Some(p) => p.clamp(0.0, 1.0),
        None => {
            let counts = rank_sum_counts_approx(m, n);
            let total: f64 = counts.iter().sum();
            let tail: f64 = counts[u..].iter().sum();
            let floor = 1.0 / binomial(n + m, m);
            (tail / total).max(floor).clamp(0.0, 1.0)
        }
    }
}

/// Exact U counts, or `None` if an intermediate leaves `i128`.
fn rank_sum_counts(m: usize, n: usize) -> Option<Vec<u128>> {
    let deg = m * n;
    let mut counts = vec![0i128; deg + 1];
    counts[0] = 1;
    for i in 1..=m {
        let shift = n + i;
        if shift <= deg {
            for k in (shift..=deg).rev() {
                counts[k] = counts[k].checked_sub(counts[k - shift])?;
            }
        }
        // Dividing by (1 - q^i) is exact here; the quotient has degree i*n.
        for k in i..=deg {
            counts[k] = counts[k].checked_add(counts[k - i])?;
        }
    }
    counts.into_iter().map(|c| u128::try_from(c).ok()).collect()
}

fn rank_sum_counts_approx(m: usize, n: usize) -> Vec<f64> {
    let deg = m * n;
    let mut counts = vec![0.0f64; deg + 1];
    counts[0] = 1.0;
    for i in 1..=m {
        let shift = n + i;
        if shift <= deg {
            for k in (shift..=deg).rev() {
                counts[k] -= counts[k - shift];
            }
        }
        for k in i..=deg {
            counts[k] += counts[k - i];
        }
    }
    counts
}

fn binomial(n: usize, k: usize) -> f64 {
    (1..=k).fold(1.0, |acc, i| acc * (n - k + i) as f64 / i as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_ranks_with_ties() {
        let (ranks, tie_term) = average_ranks(&[1.0, 2.0], &[2.0, 3.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(tie_term, 6.0);
    }

    #[test]
    fn test_exact_distribution_small_case() {
        // n1 = n2 = 2: U takes 0,1,2,2,3,4 over the 6 arrangements.
        assert!((exact_upper_tail(4, 2, 2) - 1.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(2, 2, 2) - 4.0 / 6.0).abs() < 1e-12);
        assert!((exact_upper_tail(0, 2, 2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_separated_samples_exact() {
        let res = mann_whitney_greater(&[4.0, 5.0, 6.0], &[1.0, 2.0, 3.0]);
        assert!(res.exact);
        assert_eq!(res.u_statistic, 9.0);
        // Only one of C(6,3) = 20 arrangements reaches U = 9.
        assert!((res.p_value - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_unbalanced_far_tail_stays_exact() {
        // 8 vs 1000, fully separated: one arrangement out of C(1008, 8).
        let expected = 1.0 / binomial(1008, 8);
        let p = exact_upper_tail(8000, 8, 1000);
        assert!(p > 0.0);
        assert!(((p - expected) / expected).abs() < 1e-9);
        assert!((expected - 3.889_824_733_461_082e-20).abs() < 1e-30);

        let mid = exact_upper_tail(7236, 8, 1000);
        assert!(((mid - 3.360_658_864_525_537_5e-6) / mid).abs() < 1e-9);
    }

    #[test]
    fn test_separated_unbalanced_samples() {
        let x: Vec<f64> = (1001..=1008).map(f64::from).collect();
        let y: Vec<f64> = (1..=1000).map(f64::from).collect();
        let res = mann_whitney_greater(&x, &y);
        assert!(res.exact);
        assert_eq!(res.u_statistic, 8000.0);
        assert!(res.p_value > 0.0 && res.p_value < 1e-19);
    }

    #[test]
    fn test_integer_counts_sum_to_binomial() {
        let counts = rank_sum_counts(3, 4).unwrap();
        assert_eq!(counts.len(), 13);
        assert_eq!(counts.iter().sum::<u128>(), 35);
        // Symmetric around m*n/2.
        assert!(counts.iter().eq(counts.iter().rev()));
    }
}
