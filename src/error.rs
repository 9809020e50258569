use thiserror::Error;

/// The error taxonomy of the harness. Validation-rule violations carry a
/// plain message in `Constraint`; a missing artifact, channel, column, or
/// simulator timeout is `MissingData` so the runner can turn it into a
/// "no test data" report rather than a bare crash.
#[derive(Debug, Error)]
pub enum SftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("{0}")]
    Constraint(String),
    #[error("no test data: {0}")]
    MissingData(String),
}

impl SftError {
    pub fn constraint<S: Into<String>>(msg: S) -> Self {
        SftError::Constraint(msg.into())
    }

    pub fn missing_data<S: Into<String>>(msg: S) -> Self {
        SftError::MissingData(msg.into())
    }
}
