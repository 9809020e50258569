//! Scalar tolerance comparison of an observed value against a closed-form
//! expectation.

use super::{CheckOutcome, ComparisonResult};

/// Relative-tolerance check of `observed` against `expected` (typically
/// 2-5%). An expected value of zero degenerates to an absolute comparison
/// at the same tolerance.
#[must_use]
pub fn scalar_tolerance_check(
    observed: f64,
    expected: f64,
    relative_tolerance: f64,
) -> ComparisonResult {
    let error = if expected == 0.0 {
        observed.abs()
    } else {
        (observed - expected).abs() / expected.abs()
    };
    let within = error <= relative_tolerance;
    let outcome = if within {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    };
    let verdict = if within { "within" } else { "outside" };
    let mut result = ComparisonResult::new(
        outcome,
        format!(
            "observed {observed:.6} vs expected {expected:.6}: relative error {error:.4} {verdict} tolerance {relative_tolerance}"
        ),
    );
    result.statistic = Some(error);
    result
}
