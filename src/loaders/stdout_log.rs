use std::{fs, path::Path};

use regex::Regex;

use super::ObservedSeries;
use crate::error::SftError;

/// Extracts one numeric capture group from every line of the simulator's
/// free-text stdout log that matches `pattern`. Simulator debug lines such
/// as `Update(): infectiousness=0.52` are consumed this way.
///
/// # Errors
/// - If the file does not exist or no line matches (`MissingData`)
/// - If `pattern` is invalid, names a capture group the pattern does not
///   have, or a matched group does not parse as a number
pub fn load_log_captures(
    path: &Path,
    pattern: &str,
    group: usize,
) -> Result<ObservedSeries, SftError> {
    if !path.exists() {
        return Err(SftError::missing_data(format!(
            "{} not found",
            path.display()
        )));
    }
    let re = Regex::new(pattern)?;
    if group == 0 || group > re.captures_len() - 1 {
        return Err(SftError::constraint(format!(
            "capture group {group} out of range for `{pattern}` ({} groups).",
            re.captures_len() - 1
        )));
    }

    let text = fs::read_to_string(path)?;
    let mut values = Vec::new();
    for captures in re.captures_iter(&text) {
        let raw = captures
            .get(group)
            .map(|m| m.as_str())
            .unwrap_or_default();
        let value: f64 = raw.parse().map_err(|_| {
            SftError::constraint(format!(
                "captured value `{raw}` for `{pattern}` is not numeric."
            ))
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(SftError::missing_data(format!(
            "no lines matching `{pattern}` in {}",
            path.display()
        )));
    }
    Ok(ObservedSeries::new(pattern, values))
}
