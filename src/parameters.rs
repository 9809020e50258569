use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::SftError;

/// The closed-form distribution families a check can compare against. The
/// parameters come straight out of the test's `config.json` (optionally
/// overridden by `campaign.json`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum DistributionSpec {
    Exponential { rate: f64 },
    Weibull { shape: f64, scale: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Binomial { n: u64, p: f64 },
    Poisson { lambda: f64 },
}

/// A closed-form expected-value formula evaluated from configuration scalars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FormulaSpec {
    /// `initial * exp(-rate * t)`
    ExponentialDecay { initial: f64, rate: f64, t: f64 },
    /// Survival fraction `exp(-rate * t)`
    ExponentialSurvival { rate: f64, t: f64 },
    /// Temperature-dependent rate `a1 * exp(-a2 / t_kelvin)`
    Arrhenius { a1: f64, a2: f64, t_kelvin: f64 },
    /// Expected count `n * p`
    BinomialMean { n: u64, p: f64 },
    /// Expected count `lambda`
    PoissonMean { lambda: f64 },
    /// Linear interpolation across named bins (age / CD4 / duration)
    InterpolatedBin { xs: Vec<f64>, ys: Vec<f64>, x: f64 },
}

/// Where a check's observed samples come from. File paths are relative to the
/// simulator's output directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SourceSpec {
    /// A named channel in an InsetChart/PropertyReport-shaped JSON file.
    Channel { file: PathBuf, channel: String },
    /// A numeric column of a ReportEventRecorder-shaped CSV, filtered by
    /// event name and optionally by individual id.
    EventColumn {
        file: PathBuf,
        event_name: String,
        column: String,
        individual_id: Option<u64>,
    },
    /// A regex capture group over the simulator's free-text stdout log.
    LogCapture {
        file: PathBuf,
        pattern: String,
        group: usize,
    },
}

/// An explicit window of time-step indices over the observed series,
/// declared next to the source it applies to rather than applied by index
/// arithmetic inside a comparator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub start: usize,
    pub end: usize,
}

/// The comparison to run on the observed samples.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ComparisonSpec {
    /// One-sample Kolmogorov-Smirnov against the theoretical CDF.
    KsTest { dist: DistributionSpec, alpha: f64 },
    /// Two-sample Kolmogorov-Smirnov against a generated reference sample
    /// of `reference_size` draws. Unlike `KsTest`, this works for discrete
    /// families too.
    KsTwoSample {
        dist: DistributionSpec,
        alpha: f64,
        reference_size: usize,
    },
    /// Two-sample Anderson-Darling against a generated reference sample of
    /// `reference_size` draws.
    AndersonDarling {
        dist: DistributionSpec,
        alpha: f64,
        reference_size: usize,
    },
    /// Binomial 95% confidence interval on a success count. The observed
    /// series is summed to get the count.
    BinomialCi { trials: u64, prob: f64 },
    /// Chi-squared goodness of fit of binned counts against expected counts.
    ChiSquared { expected: Vec<f64>, alpha: f64 },
    /// Scalar tolerance check of the series mean against a formula value.
    ScalarTolerance {
        formula: FormulaSpec,
        relative_tolerance: f64,
    },
    /// SEIR accounting identity: the listed channels must sum to `total`
    /// (within tolerance) at every time step.
    SeirConservation {
        channels: Vec<String>,
        file: PathBuf,
        total: f64,
        tolerance: f64,
    },
}

/// One declarative scientific-feature check: a data source, the comparison to
/// apply, and an optional window restricting the samples considered.
/// `SeirConservation` checks declare their channels inside the comparison and
/// take no separate source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSpec {
    /// Label used for the GOOD/BAD line in the report.
    pub name: String,
    #[serde(default)]
    pub source: Option<SourceSpec>,
    pub comparison: ComparisonSpec,
    pub window: Option<TimeWindow>,
}

/// Settings for waiting on the external simulator to finish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitSettings {
    /// File the simulator writes when it is done, relative to the output
    /// directory.
    pub done_marker: PathBuf,
    /// Poll interval in seconds.
    pub poll_interval_secs: f64,
    /// Wall-clock ceiling in seconds. Exceeding it is a defined failure.
    pub timeout_secs: f64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            done_marker: PathBuf::from("status.txt"),
            poll_interval_secs: 1.0,
            timeout_secs: 600.0,
        }
    }
}

/// The harness configuration for one test run, deserialized from the test's
/// `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Params {
    /// Seed for drawing reference samples from theoretical distributions.
    pub seed: u64,
    /// Name of the text report written into the output directory.
    #[serde(default = "default_report_name")]
    pub report_name: String,
    /// Whether to write per-check diagnostic CSV overlays.
    #[serde(default)]
    pub write_diagnostics: bool,
    #[serde(default)]
    pub wait: WaitSettings,
    /// The check suite to run.
    pub checks: Vec<CheckSpec>,
}

/// Fixed report file name downstream tooling expects when a test does not
/// override it.
pub const DEFAULT_REPORT_NAME: &str = "scientific_feature_report.txt";

fn default_report_name() -> String {
    DEFAULT_REPORT_NAME.to_string()
}

/// Scalar overrides that a `campaign.json` may place on top of the config.
/// Only fields present in the overlay are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignOverlay {
    pub seed: Option<u64>,
    pub report_name: Option<String>,
    pub write_diagnostics: Option<bool>,
}

fn validate_distribution(dist: &DistributionSpec) -> Result<(), SftError> {
    match *dist {
        DistributionSpec::Exponential { rate } => {
            if rate <= 0.0 {
                return Err(SftError::constraint("`rate` must be positive."));
            }
        }
        DistributionSpec::Weibull { shape, scale } => {
            if shape <= 0.0 || scale <= 0.0 {
                return Err(SftError::constraint(
                    "`shape` and `scale` must be positive.",
                ));
            }
        }
        DistributionSpec::LogNormal { sigma, .. } => {
            if sigma <= 0.0 {
                return Err(SftError::constraint("`sigma` must be positive."));
            }
        }
        DistributionSpec::Binomial { n, p } => {
            if n == 0 {
                return Err(SftError::constraint("`n` must be at least one trial."));
            }
            if !(0.0..=1.0).contains(&p) {
                return Err(SftError::constraint("`p` must be in [0, 1]."));
            }
        }
        DistributionSpec::Poisson { lambda } => {
            if lambda <= 0.0 {
                return Err(SftError::constraint("`lambda` must be positive."));
            }
        }
    }
    Ok(())
}

fn validate_comparison(comparison: &ComparisonSpec) -> Result<(), SftError> {
    match comparison {
        ComparisonSpec::KsTest { dist, alpha } => {
            validate_distribution(dist)?;
            validate_alpha(*alpha)?;
        }
        ComparisonSpec::KsTwoSample {
            dist,
            alpha,
            reference_size,
        }
        | ComparisonSpec::AndersonDarling {
            dist,
            alpha,
            reference_size,
        } => {
            validate_distribution(dist)?;
            validate_alpha(*alpha)?;
            if *reference_size < 2 {
                return Err(SftError::constraint(
                    "`reference_size` must be at least two draws.",
                ));
            }
        }
        ComparisonSpec::BinomialCi { trials, prob } => {
            validate_distribution(&DistributionSpec::Binomial {
                n: *trials,
                p: *prob,
            })?;
        }
        ComparisonSpec::ChiSquared { expected, alpha } => {
            validate_alpha(*alpha)?;
            if expected.len() < 2 {
                return Err(SftError::constraint(
                    "`expected` must have at least two bins.",
                ));
            }
            if expected.iter().any(|&e| e < 0.0) {
                return Err(SftError::constraint(
                    "`expected` bin counts must be non-negative.",
                ));
            }
        }
        ComparisonSpec::ScalarTolerance {
            relative_tolerance, ..
        } => {
            if *relative_tolerance <= 0.0 {
                return Err(SftError::constraint(
                    "`relative_tolerance` must be positive.",
                ));
            }
        }
        ComparisonSpec::SeirConservation {
            channels,
            tolerance,
            ..
        } => {
            if channels.is_empty() {
                return Err(SftError::constraint(
                    "`channels` must name at least one compartment.",
                ));
            }
            if *tolerance <= 0.0 {
                return Err(SftError::constraint("`tolerance` must be positive."));
            }
        }
    }
    Ok(())
}

fn validate_alpha(alpha: f64) -> Result<(), SftError> {
    if alpha <= 0.0 || alpha >= 1.0 {
        return Err(SftError::constraint("`alpha` must be in (0, 1)."));
    }
    Ok(())
}

pub fn validate_inputs(parameters: &Params) -> Result<(), SftError> {
    if parameters.checks.is_empty() {
        return Err(SftError::constraint(
            "The check suite must contain at least one check.",
        ));
    }
    if parameters.wait.poll_interval_secs <= 0.0 {
        return Err(SftError::constraint(
            "The completion poll interval must be positive.",
        ));
    }
    if parameters.wait.timeout_secs <= 0.0 {
        return Err(SftError::constraint(
            "The completion wait timeout must be positive.",
        ));
    }
    for check in &parameters.checks {
        if check.name.is_empty() {
            return Err(SftError::constraint("Check names must be non-empty."));
        }
        if let Some(window) = check.window {
            if window.start >= window.end {
                return Err(SftError::constraint(
                    "Time windows must satisfy start < end.",
                ));
            }
        }
        let is_conservation =
            matches!(check.comparison, ComparisonSpec::SeirConservation { .. });
        if is_conservation && check.source.is_some() {
            return Err(SftError::constraint(
                "Conservation checks declare their channels in the comparison; omit `source`.",
            ));
        }
        if !is_conservation && check.source.is_none() {
            return Err(SftError::constraint("Checks must declare a `source`."));
        }
        validate_comparison(&check.comparison)?;
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SftError> {
    if !path.exists() {
        return Err(SftError::missing_data(format!(
            "{} not found",
            path.display()
        )));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Loads and validates the harness configuration, applying the campaign
/// overlay on top of the config values when a campaign file is given.
pub fn load_params(config: &Path, campaign: Option<&Path>) -> Result<Params, SftError> {
    let mut parameters: Params = read_json(config)?;
    if let Some(campaign_path) = campaign {
        let overlay: CampaignOverlay = read_json(campaign_path)?;
        if let Some(seed) = overlay.seed {
            parameters.seed = seed;
        }
        if let Some(report_name) = overlay.report_name {
            parameters.report_name = report_name;
        }
        if let Some(write_diagnostics) = overlay.write_diagnostics {
            parameters.write_diagnostics = write_diagnostics;
        }
    }
    validate_inputs(&parameters)?;
    Ok(parameters)
}

#[cfg(test)]
mod test {
    use std::{fs::File, io::Write, path::PathBuf};

    use tempfile::tempdir;

    use super::{
        load_params, validate_inputs, CheckSpec, ComparisonSpec, DistributionSpec, Params,
        SourceSpec, TimeWindow, WaitSettings,
    };
    use crate::error::SftError;

    fn ks_check(name: &str) -> CheckSpec {
        CheckSpec {
            name: name.to_string(),
            source: Some(SourceSpec::Channel {
                file: PathBuf::from("InsetChart.json"),
                channel: "Infected".to_string(),
            }),
            comparison: ComparisonSpec::KsTest {
                dist: DistributionSpec::Exponential { rate: 0.02 },
                alpha: 0.05,
            },
            window: None,
        }
    }

    fn base_params() -> Params {
        Params {
            seed: 42,
            report_name: "scientific_feature_report.txt".to_string(),
            write_diagnostics: false,
            wait: WaitSettings::default(),
            checks: vec![ks_check("exponential duration")],
        }
    }

    #[test]
    fn test_valid_params_pass() {
        validate_inputs(&base_params()).unwrap();
    }

    #[test]
    fn test_validate_empty_checks() {
        let mut parameters = base_params();
        parameters.checks.clear();
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "The check suite must contain at least one check.");
            }
            Some(ue) => panic!(
                "Expected an error that the check suite must be non-empty. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_negative_rate() {
        let mut parameters = base_params();
        parameters.checks[0].comparison = ComparisonSpec::KsTest {
            dist: DistributionSpec::Exponential { rate: -0.5 },
            alpha: 0.05,
        };
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "`rate` must be positive.");
            }
            Some(ue) => panic!(
                "Expected an error that the rate must be positive. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_probability_bounds() {
        let mut parameters = base_params();
        parameters.checks[0].comparison = ComparisonSpec::BinomialCi {
            trials: 100,
            prob: 1.5,
        };
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "`p` must be in [0, 1].");
            }
            Some(ue) => panic!(
                "Expected an error that the probability must be in [0, 1]. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_reference_size() {
        let mut parameters = base_params();
        parameters.checks[0].comparison = ComparisonSpec::KsTwoSample {
            dist: DistributionSpec::Exponential { rate: 0.02 },
            alpha: 0.05,
            reference_size: 1,
        };
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "`reference_size` must be at least two draws.");
            }
            Some(ue) => panic!(
                "Expected an error that the reference size is too small. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_window_ordering() {
        let mut parameters = base_params();
        parameters.checks[0].window = Some(TimeWindow { start: 10, end: 10 });
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "Time windows must satisfy start < end.");
            }
            Some(ue) => panic!(
                "Expected an error that the window bounds must be ordered. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_source_required() {
        let mut parameters = base_params();
        parameters.checks[0].source = None;
        let e = validate_inputs(&parameters).err();
        match e {
            Some(SftError::Constraint(msg)) => {
                assert_eq!(msg, "Checks must declare a `source`.");
            }
            Some(ue) => panic!(
                "Expected an error that the check needs a source. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, validation passed with no errors."),
        }
    }

    #[test]
    fn test_validate_conservation_takes_no_source() {
        let mut parameters = base_params();
        parameters.checks[0].comparison = ComparisonSpec::SeirConservation {
            channels: vec!["Susceptible".to_string(), "Infected".to_string()],
            file: PathBuf::from("InsetChart.json"),
            total: 1.0,
            tolerance: 0.01,
        };
        let e = validate_inputs(&parameters).err();
        assert!(matches!(e, Some(SftError::Constraint(_))));

        parameters.checks[0].source = None;
        validate_inputs(&parameters).unwrap();
    }

    #[test]
    fn test_deserialization_distribution_spec() {
        let deserialized =
            serde_json::from_str::<DistributionSpec>("{\"Exponential\": {\"rate\": 0.02}}")
                .unwrap();
        assert_eq!(deserialized, DistributionSpec::Exponential { rate: 0.02 });
    }

    #[test]
    fn test_load_params_missing_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        let e = load_params(&path, None).err();
        match e {
            Some(SftError::MissingData(msg)) => {
                assert!(msg.ends_with("config.json not found"));
            }
            Some(ue) => panic!(
                "Expected a missing-data error for the absent config. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, loading passed with no errors."),
        }
    }

    #[test]
    fn test_load_params_campaign_overlay() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let campaign_path = temp_dir.path().join("campaign.json");

        let config = serde_json::to_string(&base_params()).unwrap();
        File::create(&config_path)
            .unwrap()
            .write_all(config.as_bytes())
            .unwrap();
        File::create(&campaign_path)
            .unwrap()
            .write_all(br#"{"seed": 99, "report_name": "overridden.txt"}"#)
            .unwrap();

        let parameters = load_params(&config_path, Some(&campaign_path)).unwrap();
        assert_eq!(parameters.seed, 99);
        assert_eq!(parameters.report_name, "overridden.txt");
        // Fields absent from the overlay keep their config values.
        assert!(!parameters.write_diagnostics);
    }
}
