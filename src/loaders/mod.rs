pub mod channel_report;
pub mod event_recorder;
pub mod stdout_log;

pub use channel_report::{load_channel_report, ChannelReport};
pub use event_recorder::load_event_column;
pub use stdout_log::load_log_captures;

use crate::error::SftError;
use crate::parameters::TimeWindow;

/// A named, ordered sequence of numeric samples extracted from one simulator
/// output artifact. Constructed once per run and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSeries {
    name: String,
    values: Vec<f64>,
}

impl ObservedSeries {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Restricts the series to `[window.start, window.end)` time-step
    /// indices. Observed and theoretical values must cover the same window
    /// for a comparison to mean anything, so an out-of-range window is an
    /// error rather than a silent clamp.
    ///
    /// # Errors
    /// - If `window.end` exceeds the series length
    pub fn window(&self, window: TimeWindow) -> Result<ObservedSeries, SftError> {
        if window.end > self.values.len() {
            return Err(SftError::constraint(format!(
                "Window [{}, {}) exceeds the {} samples of `{}`.",
                window.start,
                window.end,
                self.values.len(),
                self.name
            )));
        }
        Ok(ObservedSeries {
            name: self.name.clone(),
            values: self.values[window.start..window.end].to_vec(),
        })
    }
}
