//! Kolmogorov-Smirnov goodness-of-fit tests with the asymptotic p-value.

use super::{outcome_from_p_value, sorted_copy, CheckOutcome, ComparisonResult};
use crate::expected::TheoreticalDistribution;
use crate::loaders::ObservedSeries;

/// Below this many samples the asymptotic p-value is unreliable and the
/// check reports `Inconclusive`.
pub const MIN_KS_SAMPLES: usize = 10;

/// Complementary CDF of the Kolmogorov distribution,
/// `Q(lambda) = 2 * sum_{j>=1} (-1)^(j-1) * exp(-2 j^2 lambda^2)`.
fn kolmogorov_q(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut previous_term: f64 = 0.0;
    for j in 1..=100 {
        let term = sign * (a2 * f64::from(j * j)).exp();
        sum += term;
        if term.abs() <= 1e-12 * previous_term.abs() || term.abs() <= 1e-16 * sum.abs() {
            return (2.0 * sum).clamp(0.0, 1.0);
        }
        previous_term = term;
        sign = -sign;
    }
    // Series failed to converge; the distributions are indistinguishable.
    1.0
}

/// Effective-sample-size correction for the asymptotic distribution of the
/// KS statistic.
fn ks_p_value(statistic: f64, effective_n: f64) -> f64 {
    let en = effective_n.sqrt();
    kolmogorov_q((en + 0.12 + 0.11 / en) * statistic)
}

/// The one-sample KS statistic: the largest deviation between the empirical
/// CDF of `samples` and the theoretical CDF.
#[must_use]
pub fn ks_statistic_one_sample<F: Fn(f64) -> f64>(samples: &[f64], cdf: F) -> f64 {
    let sorted = sorted_copy(samples);
    #[allow(clippy::cast_precision_loss)]
    let n = sorted.len() as f64;
    let mut d: f64 = 0.0;
    for (i, &x) in sorted.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let below = i as f64 / n;
        #[allow(clippy::cast_precision_loss)]
        let above = (i + 1) as f64 / n;
        let theoretical = cdf(x);
        d = d.max((theoretical - below).abs()).max((above - theoretical).abs());
    }
    d
}

/// The two-sample KS statistic: the largest deviation between the two
/// empirical CDFs.
#[must_use]
pub fn ks_statistic_two_sample(first: &[f64], second: &[f64]) -> f64 {
    let a = sorted_copy(first);
    let b = sorted_copy(second);
    #[allow(clippy::cast_precision_loss)]
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        // Step both empirical CDFs past every sample tied at the current
        // value before measuring the gap, so ties never contribute a
        // transient deviation.
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let gap = (i as f64 / na - j as f64 / nb).abs();
        d = d.max(gap);
    }
    d
}

/// One-sample KS test of an observed series against a theoretical CDF.
/// Pass iff the p-value is at least `alpha`.
#[must_use]
pub fn ks_one_sample_test(
    observed: &ObservedSeries,
    dist: &TheoreticalDistribution,
    alpha: f64,
) -> ComparisonResult {
    if observed.len() < MIN_KS_SAMPLES {
        return ComparisonResult::inconclusive(format!(
            "only {} samples in `{}`; at least {MIN_KS_SAMPLES} needed for a KS test",
            observed.len(),
            observed.name()
        ));
    }
    if !dist.is_continuous() {
        return ComparisonResult::inconclusive(
        "KS test requires a continuous theoretical family; use chi-squared for counts",
        );
    }
    let statistic = ks_statistic_one_sample(observed.values(), |x| dist.cdf(x));
    #[allow(clippy::cast_precision_loss)]
    let p_value = ks_p_value(statistic, observed.len() as f64);
    let outcome = outcome_from_p_value(p_value, alpha);
    let verdict = describe(outcome);
    ComparisonResult::new(
        outcome,
        format!(
            "`{}` {verdict} one-sample KS vs theoretical CDF (D={statistic:.4}, p={p_value:.4}, alpha={alpha})",
            observed.name()
        ),
    )
    .with_test(statistic, p_value)
}

/// Two-sample KS test of an observed series against a generated reference
/// sample.
#[must_use]
pub fn ks_two_sample_test(
    observed: &ObservedSeries,
    reference: &[f64],
    alpha: f64,
) -> ComparisonResult {
    if observed.len() < MIN_KS_SAMPLES || reference.len() < MIN_KS_SAMPLES {
        return ComparisonResult::inconclusive(format!(
            "{} observed and {} reference samples; at least {MIN_KS_SAMPLES} of each needed for a KS test",
            observed.len(),
            reference.len()
        ));
    }
    let statistic = ks_statistic_two_sample(observed.values(), reference);
    #[allow(clippy::cast_precision_loss)]
    let (na, nb) = (observed.len() as f64, reference.len() as f64);
    let p_value = ks_p_value(statistic, na * nb / (na + nb));
    let outcome = outcome_from_p_value(p_value, alpha);
    let verdict = describe(outcome);
    ComparisonResult::new(
        outcome,
        format!(
            "`{}` {verdict} two-sample KS vs reference draw (D={statistic:.4}, p={p_value:.4}, alpha={alpha})",
            observed.name()
        ),
    )
    .with_test(statistic, p_value)
}

fn describe(outcome: CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::Pass => "passes",
        CheckOutcome::Fail => "fails",
        CheckOutcome::Inconclusive => "cannot run",
    }
}
