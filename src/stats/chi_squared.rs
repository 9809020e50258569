//! Chi-squared goodness-of-fit across fixed bins.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::{outcome_from_p_value, CheckOutcome, ComparisonResult};
use crate::error::SftError;

/// Each expected bin count must reach this floor for the chi-squared
/// approximation to hold.
pub const MIN_EXPECTED_PER_BIN: f64 = 5.0;

/// Multinomial goodness-of-fit of observed bin counts against expected bin
/// counts, with `bins - 1` degrees of freedom. Pass iff the p-value is at
/// least `alpha`; an expected bin below the approximation floor makes the
/// check `Inconclusive`.
///
/// # Errors
/// - If the observed and expected bin counts differ in number
pub fn chi_squared_test(
    observed: &[f64],
    expected: &[f64],
    alpha: f64,
) -> Result<ComparisonResult, SftError> {
    if observed.len() != expected.len() {
        return Err(SftError::constraint(format!(
            "{} observed bins vs {} expected bins.",
            observed.len(),
            expected.len()
        )));
    }
    if expected.len() < 2 {
        return Err(SftError::constraint(
            "At least two bins are required for a chi-squared test.",
        ));
    }
    if let Some(small) = expected.iter().find(|&&e| e < MIN_EXPECTED_PER_BIN) {
        return Ok(ComparisonResult::inconclusive(format!(
            "expected bin count {small:.2} below {MIN_EXPECTED_PER_BIN}; chi-squared approximation invalid"
        )));
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(o, e)| (o - e) * (o - e) / e)
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let degrees_of_freedom = (expected.len() - 1) as f64;
    let chi = ChiSquared::new(degrees_of_freedom)
        .map_err(|e| SftError::constraint(e.to_string()))?;
    let p_value = 1.0 - chi.cdf(statistic);
    let outcome = outcome_from_p_value(p_value, alpha);
    let verdict = match outcome {
        CheckOutcome::Pass => "consistent with",
        CheckOutcome::Fail => "inconsistent with",
        CheckOutcome::Inconclusive => "untestable against",
    };
    Ok(ComparisonResult::new(
        outcome,
        format!(
            "binned counts {verdict} expectation (chi2={statistic:.4}, df={degrees_of_freedom}, p={p_value:.4}, alpha={alpha})"
        ),
    )
    .with_test(statistic, p_value))
}

#[cfg(test)]
mod test {
    use super::chi_squared_test;
    use crate::error::SftError;
    use crate::stats::CheckOutcome;

    #[test]
    fn test_exact_match_passes() {
        let result = chi_squared_test(&[25.0, 25.0, 25.0, 25.0], &[25.0; 4], 0.05).unwrap();
        assert_eq!(result.outcome, CheckOutcome::Pass, "{}", result.explanation);
        assert!(result.p_value.unwrap() > 0.99);
    }

    #[test]
    fn test_small_fluctuation_passes() {
        let result = chi_squared_test(&[22.0, 28.0, 24.0, 26.0], &[25.0; 4], 0.05).unwrap();
        assert_eq!(result.outcome, CheckOutcome::Pass, "{}", result.explanation);
    }

    #[test]
    fn test_gross_mismatch_fails() {
        let result = chi_squared_test(&[5.0, 45.0, 45.0, 5.0], &[25.0; 4], 0.05).unwrap();
        assert_eq!(result.outcome, CheckOutcome::Fail, "{}", result.explanation);
    }

    #[test]
    fn test_small_expected_bin_is_inconclusive() {
        let result = chi_squared_test(&[1.0, 99.0], &[2.0, 98.0], 0.05).unwrap();
        assert_eq!(result.outcome, CheckOutcome::Inconclusive);
    }

    #[test]
    fn test_bin_count_mismatch_errors() {
        let e = chi_squared_test(&[1.0, 2.0], &[1.0, 2.0, 3.0], 0.05).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "2 observed bins vs 3 expected bins.");
            }
            Some(ue) => panic!(
                "Expected an error that the bin counts must match. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, the test ran with no errors."),
        }
    }
}
