use std::path::Path;

use super::ObservedSeries;
use crate::error::SftError;

/// Projects one numeric column of a ReportEventRecorder-shaped CSV into an
/// [`ObservedSeries`], keeping only rows whose `Event_Name` matches
/// `event_name` (and, when given, whose `Individual_ID` matches
/// `individual_id`). Row order is preserved.
///
/// # Errors
/// - If the file does not exist, the requested column is absent, or no row
///   survives the filter (`MissingData`)
/// - If a surviving row's value does not parse as a number
pub fn load_event_column(
    path: &Path,
    event_name: &str,
    column: &str,
    individual_id: Option<u64>,
) -> Result<ObservedSeries, SftError> {
    if !path.exists() {
        return Err(SftError::missing_data(format!(
            "{} not found",
            path.display()
        )));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column_index = find_column(&headers, column)?;
    let event_index = find_column(&headers, "Event_Name")?;
    let id_index = match individual_id {
        Some(_) => Some(find_column(&headers, "Individual_ID")?),
        None => None,
    };

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.get(event_index) != Some(event_name) {
            continue;
        }
        if let (Some(id), Some(index)) = (individual_id, id_index) {
            let row_id: u64 = record
                .get(index)
                .unwrap_or_default()
                .parse()
                .map_err(|_| {
                    SftError::constraint(format!(
                        "`Individual_ID` value `{}` is not an integer.",
                        record.get(index).unwrap_or_default()
                    ))
                })?;
            if row_id != id {
                continue;
            }
        }
        let raw = record.get(column_index).unwrap_or_default();
        let value: f64 = raw.parse().map_err(|_| {
            SftError::constraint(format!("`{column}` value `{raw}` is not numeric."))
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(SftError::missing_data(format!(
            "no rows with event `{event_name}` in {}",
            path.display()
        )));
    }
    Ok(ObservedSeries::new(column, values))
}

fn find_column(headers: &csv::StringRecord, column: &str) -> Result<usize, SftError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SftError::missing_data(format!("column `{column}` absent")))
}
