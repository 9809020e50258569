//! Human-facing diagnostic dumps written next to the report. Nothing
//! downstream reads these back; they exist so a failing distributional
//! check can be eyeballed.

use std::path::Path;

use serde::Serialize;

use crate::error::SftError;
use crate::expected::TheoreticalDistribution;
use crate::loaders::ObservedSeries;
use crate::stats::sorted_copy;

#[derive(Serialize)]
struct OverlayRow {
    rank: usize,
    observed: f64,
    theoretical_quantile: f64,
    empirical_cdf: f64,
    theoretical_cdf: f64,
}

/// Writes a sorted-sample overlay: each observed order statistic beside the
/// theoretical quantile at the same plotting position, plus both CDFs at
/// the observed value. Plotting positions are `(rank + 0.5) / n`.
///
/// # Errors
/// - If the CSV file cannot be written
pub fn write_overlay(
    path: &Path,
    observed: &ObservedSeries,
    dist: &TheoreticalDistribution,
) -> Result<(), SftError> {
    let sorted = sorted_copy(observed.values());
    #[allow(clippy::cast_precision_loss)]
    let n = sorted.len() as f64;
    let mut writer = csv::Writer::from_path(path)?;
    for (rank, &value) in sorted.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let position = (rank as f64 + 0.5) / n;
        writer.serialize(OverlayRow {
            rank,
            observed: value,
            theoretical_quantile: dist.quantile(position),
            empirical_cdf: position,
            theoretical_cdf: dist.cdf(value),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// File-system-safe diagnostic file name derived from a check name.
#[must_use]
pub fn overlay_file_name(check_name: &str) -> String {
    let slug: String = check_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{slug}_overlay.csv")
}
