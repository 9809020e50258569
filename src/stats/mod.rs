pub mod anderson_darling;
pub mod binomial;
pub mod chi_squared;
pub mod ks;
pub mod tolerance;

pub use anderson_darling::anderson_darling_test;
pub use binomial::binomial_ci_check;
pub use chi_squared::chi_squared_test;
pub use ks::{ks_one_sample_test, ks_two_sample_test};
pub use tolerance::scalar_tolerance_check;

/// The three-state verdict of a check. A sample too small for a valid
/// statistical test is `Inconclusive`, never `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    Inconclusive,
}

/// What a comparator hands to the report writer: the verdict, a
/// human-readable explanation, and the test statistic and p-value where the
/// test produces them.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub outcome: CheckOutcome,
    pub explanation: String,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

impl ComparisonResult {
    #[must_use]
    pub fn new<S: Into<String>>(outcome: CheckOutcome, explanation: S) -> Self {
        Self {
            outcome,
            explanation: explanation.into(),
            statistic: None,
            p_value: None,
        }
    }

    #[must_use]
    pub fn with_test(mut self, statistic: f64, p_value: f64) -> Self {
        self.statistic = Some(statistic);
        self.p_value = Some(p_value);
        self
    }

    #[must_use]
    pub fn inconclusive<S: Into<String>>(explanation: S) -> Self {
        Self::new(CheckOutcome::Inconclusive, explanation)
    }
}

/// Verdict from a p-value against a significance threshold: the observed
/// data is consistent with the theoretical distribution iff `p >= alpha`.
#[must_use]
pub fn outcome_from_p_value(p_value: f64, alpha: f64) -> CheckOutcome {
    if p_value >= alpha {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    }
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

#[must_use]
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1.0)
}

/// Sorted copy for empirical-CDF walks. NaNs are rejected upstream by the
/// loaders, so total order on the remaining values is safe.
#[must_use]
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

#[cfg(test)]
mod test {
    use statrs::assert_almost_eq;

    use super::{mean, outcome_from_p_value, sample_variance, sorted_copy, CheckOutcome};

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_almost_eq!(mean(&values), 5.0, 1e-12);
        assert_almost_eq!(sample_variance(&values), 32.0 / 7.0, 1e-12);
    }

    #[test]
    fn test_sorted_copy_leaves_input_alone() {
        let values = [3.0, 1.0, 2.0];
        let sorted = sorted_copy(&values);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
        assert_eq!(values, [3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_outcome_threshold_is_inclusive() {
        assert_eq!(outcome_from_p_value(0.05, 0.05), CheckOutcome::Pass);
        assert_eq!(outcome_from_p_value(0.049, 0.05), CheckOutcome::Fail);
    }
}
