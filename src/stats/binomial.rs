//! Normal-approximation confidence-interval check for binomial counts.

use super::{CheckOutcome, ComparisonResult};

/// The normal approximation is only valid when both `n*p` and `n*(1-p)`
/// reach this floor.
pub const NORMAL_APPROXIMATION_FLOOR: f64 = 5.0;

/// Checks that a success count lies within `n*p +/- 2*sqrt(n*p*(1-p))`,
/// the 95% normal-approximation interval. When the approximation's
/// precondition fails the check is `Inconclusive`, never `Fail`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn binomial_ci_check(successes: f64, trials: u64, prob: f64) -> ComparisonResult {
    let n = trials as f64;
    let expected = n * prob;
    let complement = n * (1.0 - prob);
    if expected < NORMAL_APPROXIMATION_FLOOR || complement < NORMAL_APPROXIMATION_FLOOR {
        return ComparisonResult::inconclusive(format!(
            "normal approximation invalid: n*p={expected:.2}, n*(1-p)={complement:.2}, both must be >= {NORMAL_APPROXIMATION_FLOOR}"
        ));
    }
    let sigma = (n * prob * (1.0 - prob)).sqrt();
    let (lower, upper) = (expected - 2.0 * sigma, expected + 2.0 * sigma);
    let within = successes >= lower && successes <= upper;
    let outcome = if within {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    };
    let verdict = if within { "within" } else { "outside" };
    let mut result = ComparisonResult::new(
        outcome,
        format!(
            "{successes} successes of {trials} trials {verdict} 95% CI [{lower:.2}, {upper:.2}] for p={prob}"
        ),
    );
    // The CI check has a statistic (the count) but no p-value.
    result.statistic = Some(successes);
    result
}
