//! Closed-form expected-value formulas. Every function here is a pure
//! function of immutable scalar inputs pulled from config/campaign files.

use crate::error::SftError;
use crate::parameters::FormulaSpec;

/// Amount remaining after exponential decay, `initial * exp(-rate * t)`.
#[must_use]
pub fn exponential_decay(initial: f64, rate: f64, t: f64) -> f64 {
    initial * (-rate * t).exp()
}

/// Fraction surviving past `t` under a constant hazard, `exp(-rate * t)`.
#[must_use]
pub fn exponential_survival(rate: f64, t: f64) -> f64 {
    (-rate * t).exp()
}

/// Arrhenius temperature-dependent rate: `a1 * exp(-a2 / t_kelvin)`.
#[must_use]
pub fn arrhenius_rate(a1: f64, a2: f64, t_kelvin: f64) -> f64 {
    a1 * (-a2 / t_kelvin).exp()
}

/// Expected success count of `n` Bernoulli trials.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn binomial_expected_count(n: u64, p: f64) -> f64 {
    n as f64 * p
}

/// Expected count of a Poisson process.
#[must_use]
pub fn poisson_expected_count(lambda: f64) -> f64 {
    lambda
}

/// Linear interpolation of `x` across named bins `(xs, ys)`. Values of `x`
/// outside the bin range clamp to the first/last bin value, which is how
/// the simulator treats out-of-range ages and CD4 counts.
///
/// # Errors
/// - If `xs` and `ys` differ in length, have fewer than two bins, or `xs`
///   is not sorted ascending
pub fn interpolated_bin_value(xs: &[f64], ys: &[f64], x: f64) -> Result<f64, SftError> {
    if xs.len() != ys.len() {
        return Err(SftError::constraint(
            "`xs` and `ys` must have the same length.",
        ));
    }
    if xs.len() < 2 {
        return Err(SftError::constraint(
            "`xs` and `ys` must have at least two bins.",
        ));
    }
    if !xs.is_sorted() {
        return Err(SftError::constraint(
            "`xs` must be sorted in ascending order.",
        ));
    }
    if x <= xs[0] {
        return Ok(ys[0]);
    }
    if x >= xs[xs.len() - 1] {
        return Ok(ys[ys.len() - 1]);
    }
    let upper = xs.partition_point(|&edge| edge < x);
    let lower = upper - 1;
    let (x1, x2) = (xs[lower], xs[upper]);
    let (y1, y2) = (ys[lower], ys[upper]);
    // Adjacent edges can coincide at the tails of an empirical CDF; the
    // slope is undefined there, so average the bin values.
    #[allow(clippy::float_cmp)]
    if x1 == x2 {
        return Ok((y1 + y2) / 2.0);
    }
    Ok(y1 + (y2 - y1) / (x2 - x1) * (x - x1))
}

/// Per-timestep totals across SEIR compartment series, for checking the
/// accounting identity that compartment fractions sum to the whole
/// population at every step.
///
/// # Errors
/// - If no compartments are given or their lengths differ
pub fn seir_totals(compartments: &[&[f64]]) -> Result<Vec<f64>, SftError> {
    let Some(first) = compartments.first() else {
        return Err(SftError::constraint(
            "At least one compartment series is required.",
        ));
    };
    if compartments.iter().any(|c| c.len() != first.len()) {
        return Err(SftError::constraint(
            "All compartment series must have the same length.",
        ));
    }
    Ok((0..first.len())
        .map(|t| compartments.iter().map(|c| c[t]).sum())
        .collect())
}

/// Evaluates a configured formula to its scalar value.
///
/// # Errors
/// - If an `InterpolatedBin` formula has malformed bins
pub fn evaluate_formula(formula: &FormulaSpec) -> Result<f64, SftError> {
    match formula {
        FormulaSpec::ExponentialDecay { initial, rate, t } => {
            Ok(exponential_decay(*initial, *rate, *t))
        }
        FormulaSpec::ExponentialSurvival { rate, t } => Ok(exponential_survival(*rate, *t)),
        FormulaSpec::Arrhenius { a1, a2, t_kelvin } => Ok(arrhenius_rate(*a1, *a2, *t_kelvin)),
        FormulaSpec::BinomialMean { n, p } => Ok(binomial_expected_count(*n, *p)),
        FormulaSpec::PoissonMean { lambda } => Ok(poisson_expected_count(*lambda)),
        FormulaSpec::InterpolatedBin { xs, ys, x } => interpolated_bin_value(xs, ys, *x),
    }
}

#[cfg(test)]
mod test {
    use statrs::assert_almost_eq;

    use super::{
        arrhenius_rate, evaluate_formula, exponential_decay, exponential_survival,
        interpolated_bin_value, seir_totals,
    };
    use crate::error::SftError;
    use crate::parameters::FormulaSpec;

    #[test]
    fn test_exponential_decay_halving() {
        let half_life = 2.0_f64.ln() / 0.1;
        assert_almost_eq!(exponential_decay(100.0, 0.1, half_life), 50.0, 1e-9);
    }

    #[test]
    fn test_exponential_survival_at_zero() {
        assert_almost_eq!(exponential_survival(0.5, 0.0), 1.0, 0.0);
    }

    #[test]
    fn test_arrhenius_rate_increases_with_temperature() {
        // Larval development rates are configured with a1 ~ 1e5, a2 ~ 8e3.
        let cold = arrhenius_rate(1.0e5, 8.0e3, 285.0);
        let warm = arrhenius_rate(1.0e5, 8.0e3, 305.0);
        assert!(warm > cold);
        assert_almost_eq!(cold, 1.0e5 * (-8.0e3_f64 / 285.0).exp(), 1e-12);
    }

    #[test]
    fn test_interpolated_bin_value_midpoint() {
        let xs = [0.0, 20.0, 60.0];
        let ys = [0.1, 0.3, 0.5];
        assert_almost_eq!(interpolated_bin_value(&xs, &ys, 10.0).unwrap(), 0.2, 1e-12);
        assert_almost_eq!(interpolated_bin_value(&xs, &ys, 40.0).unwrap(), 0.4, 1e-12);
    }

    #[test]
    fn test_interpolated_bin_value_clamps_outside_range() {
        let xs = [0.0, 20.0];
        let ys = [0.1, 0.3];
        assert_almost_eq!(interpolated_bin_value(&xs, &ys, -5.0).unwrap(), 0.1, 0.0);
        assert_almost_eq!(interpolated_bin_value(&xs, &ys, 25.0).unwrap(), 0.3, 0.0);
    }

    #[test]
    fn test_interpolated_bin_value_unsorted() {
        let e = interpolated_bin_value(&[1.0, 0.5, 2.0], &[0.0, 0.0, 0.0], 1.0).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "`xs` must be sorted in ascending order.");
            }
            Some(ue) => panic!(
                "Expected an error that the bins must be sorted. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, interpolation passed with no errors."),
        }
    }

    #[test]
    fn test_interpolated_bin_value_length_mismatch() {
        let e = interpolated_bin_value(&[1.0, 2.0], &[0.0], 1.5).err();
        assert!(matches!(e, Some(SftError::Constraint(_))));
    }

    #[test]
    fn test_seir_totals_conserved() {
        let s = [0.9, 0.7, 0.5];
        let e = [0.1, 0.2, 0.2];
        let i = [0.0, 0.1, 0.2];
        let r = [0.0, 0.0, 0.1];
        let totals = seir_totals(&[&s, &e, &i, &r]).unwrap();
        for total in totals {
            assert_almost_eq!(total, 1.0, 1e-12);
        }
    }

    #[test]
    fn test_seir_totals_length_mismatch() {
        let e = seir_totals(&[&[1.0, 2.0], &[1.0]]).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "All compartment series must have the same length.");
            }
            Some(ue) => panic!(
                "Expected an error that the series lengths must match. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, totalling passed with no errors."),
        }
    }

    #[test]
    fn test_evaluate_formula_dispatch() {
        let value = evaluate_formula(&FormulaSpec::BinomialMean { n: 100, p: 0.5 }).unwrap();
        assert_almost_eq!(value, 50.0, 0.0);
    }
}
