// Re-export commonly used types at the crate root
pub use error::SftError;
pub use loaders::ObservedSeries;
pub use parameters::{
    load_params, validate_inputs, CheckSpec, ComparisonSpec, DistributionSpec, FormulaSpec,
    Params, SourceSpec, TimeWindow, WaitSettings, DEFAULT_REPORT_NAME,
};
pub use runner::{application, RunSettings};
pub use stats::{CheckOutcome, ComparisonResult};

// Module declarations
pub mod diagnostics;
pub mod error;
pub mod expected;
pub mod loaders;
pub mod parameters;
pub mod report;
pub mod runner;
pub mod stats;
pub mod wait;

// Re-export common macros
pub use statrs::assert_almost_eq;
