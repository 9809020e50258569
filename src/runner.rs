//! The per-test pipeline: wait for the simulator, load artifacts, compute
//! expected values, compare, and write the report. Invoked once per test
//! run; no state survives between invocations.

use std::fs;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::diagnostics::{overlay_file_name, write_overlay};
use crate::error::SftError;
use crate::expected::{evaluate_formula, formulas::seir_totals, TheoreticalDistribution};
use crate::loaders::{
    load_channel_report, load_event_column, load_log_captures, ObservedSeries,
};
use crate::parameters::{
    load_params, CheckSpec, ComparisonSpec, SourceSpec, DEFAULT_REPORT_NAME,
};
use crate::report::Reporter;
use crate::stats::{
    anderson_darling_test, binomial_ci_check, chi_squared_test, ks_one_sample_test,
    ks_two_sample_test, mean, scalar_tolerance_check, CheckOutcome, ComparisonResult,
};
use crate::wait::wait_for_done;

/// Everything the CLI hands the pipeline for one invocation.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// The simulator's private output directory for this run.
    pub output_directory: PathBuf,
    pub config: PathBuf,
    pub campaign: Option<PathBuf>,
    /// Overrides the config's report name when set.
    pub report_name: Option<String>,
    /// Overrides the file of every `LogCapture` source when set.
    pub stdout_filename: Option<PathBuf>,
}

/// Runs the whole check suite and writes the report. Returns the summary
/// flag. Missing artifacts and simulator timeouts produce a failing report
/// rather than an error; only harness defects (malformed config, unwritable
/// output) surface as `Err`.
///
/// # Errors
/// - If the config is malformed or the report cannot be written
pub fn application(settings: &RunSettings) -> Result<bool, SftError> {
    let parameters = match load_params(&settings.config, settings.campaign.as_deref()) {
        Ok(parameters) => parameters,
        Err(SftError::MissingData(detail)) => {
            return abort_without_data(settings, DEFAULT_REPORT_NAME, &detail);
        }
        Err(e) => return Err(e),
    };
    let report_name = settings
        .report_name
        .clone()
        .unwrap_or_else(|| parameters.report_name.clone());

    match wait_for_done(&settings.output_directory, &parameters.wait) {
        Ok(_) => {}
        Err(SftError::MissingData(detail)) => {
            return abort_without_data(settings, &report_name, &detail);
        }
        Err(e) => return Err(e),
    }

    let mut rng = StdRng::seed_from_u64(parameters.seed);
    let mut reporter = Reporter::new();
    for check in &parameters.checks {
        match run_check(settings, check, &mut rng, parameters.write_diagnostics) {
            Ok(result) => {
                info!("check `{}`: {}", check.name, result.explanation);
                reporter.record(&check.name, &result);
            }
            Err(SftError::MissingData(detail)) => {
                warn!("check `{}` has no test data: {detail}", check.name);
                reporter.record_no_test_data(&check.name, &detail);
            }
            Err(e) => return Err(e),
        }
    }

    let report_path = settings.output_directory.join(&report_name);
    reporter.write(&report_path)?;
    info!(
        "wrote {}; Success={}",
        report_path.display(),
        reporter.success()
    );
    Ok(reporter.success())
}

/// Writes a one-line failing report when the run cannot even start (config
/// or simulator output absent).
fn abort_without_data(
    settings: &RunSettings,
    report_name: &str,
    detail: &str,
) -> Result<bool, SftError> {
    warn!("aborting run: {detail}");
    fs::create_dir_all(&settings.output_directory)?;
    let mut reporter = Reporter::new();
    reporter.record_no_test_data("harness", detail);
    reporter.write(&settings.output_directory.join(report_name))?;
    Ok(false)
}

fn load_source(settings: &RunSettings, source: &SourceSpec) -> Result<ObservedSeries, SftError> {
    match source {
        SourceSpec::Channel { file, channel } => {
            load_channel_report(&settings.output_directory.join(file))?.extract(channel)
        }
        SourceSpec::EventColumn {
            file,
            event_name,
            column,
            individual_id,
        } => load_event_column(
            &settings.output_directory.join(file),
            event_name,
            column,
            *individual_id,
        ),
        SourceSpec::LogCapture {
            file,
            pattern,
            group,
        } => {
            let file = settings.stdout_filename.as_ref().unwrap_or(file);
            load_log_captures(&settings.output_directory.join(file), pattern, *group)
        }
    }
}

fn run_check(
    settings: &RunSettings,
    check: &CheckSpec,
    rng: &mut StdRng,
    write_diagnostics: bool,
) -> Result<ComparisonResult, SftError> {
    if let ComparisonSpec::SeirConservation {
        channels,
        file,
        total,
        tolerance,
    } = &check.comparison
    {
        return conservation_check(settings, check, channels, file, *total, *tolerance);
    }

    // Validation guarantees every non-conservation check has a source.
    let source = check
        .source
        .as_ref()
        .ok_or_else(|| SftError::constraint("Checks must declare a `source`."))?;
    let mut series = load_source(settings, source)?;
    if let Some(window) = check.window {
        series = series.window(window)?;
    }

    match &check.comparison {
        ComparisonSpec::KsTest { dist, alpha } => {
            let dist = TheoreticalDistribution::from_spec(*dist)?;
            maybe_write_overlay(settings, check, &series, &dist, write_diagnostics)?;
            Ok(ks_one_sample_test(&series, &dist, *alpha))
        }
        ComparisonSpec::KsTwoSample {
            dist,
            alpha,
            reference_size,
        } => {
            let dist = TheoreticalDistribution::from_spec(*dist)?;
            maybe_write_overlay(settings, check, &series, &dist, write_diagnostics)?;
            let reference = dist.sample(*reference_size, rng)?;
            Ok(ks_two_sample_test(&series, &reference, *alpha))
        }
        ComparisonSpec::AndersonDarling {
            dist,
            alpha,
            reference_size,
        } => {
            let dist = TheoreticalDistribution::from_spec(*dist)?;
            maybe_write_overlay(settings, check, &series, &dist, write_diagnostics)?;
            let reference = dist.sample(*reference_size, rng)?;
            Ok(anderson_darling_test(&series, &reference, *alpha))
        }
        ComparisonSpec::BinomialCi { trials, prob } => {
            Ok(binomial_ci_check(series.sum(), *trials, *prob))
        }
        ComparisonSpec::ChiSquared { expected, alpha } => {
            chi_squared_test(series.values(), expected, *alpha)
        }
        ComparisonSpec::ScalarTolerance {
            formula,
            relative_tolerance,
        } => {
            let expected = evaluate_formula(formula)?;
            Ok(scalar_tolerance_check(
                mean(series.values()),
                expected,
                *relative_tolerance,
            ))
        }
        ComparisonSpec::SeirConservation { .. } => {
            unreachable!("conservation checks return early above")
        }
    }
}

fn maybe_write_overlay(
    settings: &RunSettings,
    check: &CheckSpec,
    series: &ObservedSeries,
    dist: &TheoreticalDistribution,
    write_diagnostics: bool,
) -> Result<(), SftError> {
    if write_diagnostics {
        let path = settings
            .output_directory
            .join(overlay_file_name(&check.name));
        write_overlay(&path, series, dist)?;
    }
    Ok(())
}

/// The SEIR accounting identity: the named compartment channels must sum to
/// the configured total at every time step.
fn conservation_check(
    settings: &RunSettings,
    check: &CheckSpec,
    channels: &[String],
    file: &std::path::Path,
    total: f64,
    tolerance: f64,
) -> Result<ComparisonResult, SftError> {
    let report = load_channel_report(&settings.output_directory.join(file))?;
    let mut compartments = Vec::with_capacity(channels.len());
    for channel in channels {
        let mut series = report.extract(channel)?;
        if let Some(window) = check.window {
            series = series.window(window)?;
        }
        compartments.push(series);
    }
    let slices: Vec<&[f64]> = compartments.iter().map(ObservedSeries::values).collect();
    let totals = seir_totals(&slices)?;

    let worst = totals
        .iter()
        .map(|t| (t - total).abs())
        .fold(0.0_f64, f64::max);
    let within = worst <= tolerance;
    let outcome = if within {
        CheckOutcome::Pass
    } else {
        CheckOutcome::Fail
    };
    let verdict = if within { "holds" } else { "violated" };
    let mut result = ComparisonResult::new(
        outcome,
        format!(
            "conservation of {} compartments {verdict}: worst deviation {worst:.6} from {total} (tolerance {tolerance})",
            channels.len()
        ),
    );
    result.statistic = Some(worst);
    Ok(result)
}
