//! Scholz-Stephens k-sample Anderson-Darling test, applied here with k = 2:
//! an observed series against a generated reference sample. Ties are
//! handled with midranks.

use super::{outcome_from_p_value, sorted_copy, CheckOutcome, ComparisonResult};
use crate::loaders::ObservedSeries;

/// Below this many samples per side the normalized statistic is unreliable
/// and the check reports `Inconclusive`.
pub const MIN_AD_SAMPLES: usize = 5;

/// Significance levels the critical-value table covers.
const TABLE_P: [f64; 7] = [0.25, 0.10, 0.05, 0.025, 0.01, 0.005, 0.001];
const B0: [f64; 7] = [0.675, 1.281, 1.645, 1.960, 2.326, 2.573, 3.085];
const B1: [f64; 7] = [-0.245, 0.250, 0.678, 1.149, 1.822, 2.364, 3.615];
const B2: [f64; 7] = [-0.105, -0.305, -0.362, -0.391, -0.396, -0.345, -0.154];

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

/// Number of elements of the sorted slice `values` that are strictly less
/// than `x`, and the number less than or equal to `x`.
fn rank_counts(values: &[f64], x: f64) -> (f64, f64) {
    let left = values.partition_point(|&v| v < x);
    let right = values.partition_point(|&v| v <= x);
    (to_f64(left), to_f64(right))
}

/// The midrank k-sample Anderson-Darling statistic `A2akN`.
fn a2_midrank(samples: &[&[f64]]) -> f64 {
    let sorted: Vec<Vec<f64>> = samples.iter().map(|s| sorted_copy(s)).collect();
    let mut pooled: Vec<f64> = samples.iter().flat_map(|s| s.iter().copied()).collect();
    pooled.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut unique = pooled.clone();
    unique.dedup();

    let n_total = to_f64(pooled.len());
    let mut a2 = 0.0;
    for sample in &sorted {
        let n_i = to_f64(sample.len());
        let mut inner = 0.0;
        for &z in &unique {
            let (pool_left, pool_right) = rank_counts(&pooled, z);
            let l_j = pool_right - pool_left;
            let b_j = pool_left + l_j / 2.0;
            let (s_left, s_right) = rank_counts(sample, z);
            let m_ij = s_right - (s_right - s_left) / 2.0;
            let denominator = b_j * (n_total - b_j) - n_total * l_j / 4.0;
            if denominator <= 0.0 {
                // Only possible at the extreme pooled values when every
                // observation ties; the term contributes nothing.
                continue;
            }
            let deviation = n_total * m_ij - b_j * n_i;
            inner += l_j / n_total * deviation * deviation / denominator;
        }
        a2 += inner / n_i;
    }
    a2 * (n_total - 1.0) / n_total
}

/// Variance of `A2akN` under the null (Scholz & Stephens 1987, eq. 4).
fn a2_variance(sample_sizes: &[usize]) -> f64 {
    let k = to_f64(sample_sizes.len());
    let n_total: usize = sample_sizes.iter().sum();
    let n = to_f64(n_total);

    let h: f64 = sample_sizes.iter().map(|&n_i| 1.0 / to_f64(n_i)).sum();
    let h_small: f64 = (1..n_total).map(|i| 1.0 / to_f64(i)).sum();
    let mut g = 0.0;
    for i in 1..n_total - 1 {
        for j in (i + 1)..n_total {
            g += 1.0 / (to_f64(n_total - i) * to_f64(j));
        }
    }

    let a = (4.0 * g - 6.0) * (k - 1.0) + (10.0 - 6.0 * g) * h;
    let b = (2.0 * g - 4.0) * k * k + 8.0 * h_small * k
        + (2.0 * g - 14.0 * h_small - 4.0) * h
        - 8.0 * h_small
        + 4.0 * g
        - 6.0;
    let c = (6.0 * h_small + 2.0 * g - 2.0) * k * k
        + (4.0 * h_small - 4.0 * g + 6.0) * k
        + (2.0 * h_small - 6.0) * h
        + 4.0 * h_small;
    let d = (2.0 * h_small + 6.0) * k * k - 4.0 * h_small * k;

    (a * n.powi(3) + b * n.powi(2) + c * n + d) / ((n - 1.0) * (n - 2.0) * (n - 3.0))
}

/// Least-squares quadratic fit `y ~ c0 + c1 x + c2 x^2`.
fn polyfit2(xs: &[f64], ys: &[f64]) -> [f64; 3] {
    let mut s = [0.0_f64; 5];
    let mut t = [0.0_f64; 3];
    for (&x, &y) in xs.iter().zip(ys) {
        let mut power = 1.0;
        for (i, slot) in s.iter_mut().enumerate() {
            *slot += power;
            if i < 3 {
                t[i] += power * y;
            }
            power *= x;
        }
    }
    // Normal equations, 3x3 Gaussian elimination with partial pivoting.
    let mut m = [
        [s[0], s[1], s[2], t[0]],
        [s[1], s[2], s[3], t[1]],
        [s[2], s[3], s[4], t[2]],
    ];
    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&a, &b| {
                m[a][col]
                    .abs()
                    .partial_cmp(&m[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        m.swap(col, pivot);
        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = m[row][col] / m[col][col];
            for entry in col..4 {
                m[row][entry] -= factor * m[col][entry];
            }
        }
    }
    [m[0][3] / m[0][0], m[1][3] / m[1][1], m[2][3] / m[2][2]]
}

/// P-value for the normalized statistic `t`, interpolated over the
/// Scholz-Stephens critical-value table for `k - 1 = m` degrees.
fn ad_p_value(t: f64, m: f64) -> f64 {
    let critical: Vec<f64> = (0..7)
        .map(|i| B0[i] + B1[i] / m.sqrt() + B2[i] / m)
        .collect();
    let log_p: Vec<f64> = TABLE_P.iter().map(|p| p.ln()).collect();
    let coefficients = polyfit2(&critical, &log_p);
    let fitted = coefficients[0] + coefficients[1] * t + coefficients[2] * t * t;
    // The table only resolves p in [0.001, 0.25]; clamp outside it.
    fitted.exp().clamp(0.001, 0.25)
}

/// Two-sample Anderson-Darling test of an observed series against a
/// generated reference sample. Pass iff the p-value is at least `alpha`.
#[must_use]
pub fn anderson_darling_test(
    observed: &ObservedSeries,
    reference: &[f64],
    alpha: f64,
) -> ComparisonResult {
    if observed.len() < MIN_AD_SAMPLES || reference.len() < MIN_AD_SAMPLES {
        return ComparisonResult::inconclusive(format!(
            "{} observed and {} reference samples; at least {MIN_AD_SAMPLES} of each needed for an Anderson-Darling test",
            observed.len(),
            reference.len()
        ));
    }
    let sizes = [observed.len(), reference.len()];
    let a2 = a2_midrank(&[observed.values(), reference]);
    let m = to_f64(sizes.len()) - 1.0;
    let statistic = (a2 - m) / a2_variance(&sizes).sqrt();
    let p_value = ad_p_value(statistic, m);
    let outcome = outcome_from_p_value(p_value, alpha);
    let verdict = match outcome {
        CheckOutcome::Pass => "passes",
        CheckOutcome::Fail => "fails",
        CheckOutcome::Inconclusive => "cannot run",
    };
    ComparisonResult::new(
        outcome,
        format!(
            "`{}` {verdict} two-sample Anderson-Darling vs reference draw (T={statistic:.4}, p={p_value:.4}, alpha={alpha})",
            observed.name()
        ),
    )
    .with_test(statistic, p_value)
}
