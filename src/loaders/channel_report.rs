use std::{fs::File, io::BufReader, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use super::ObservedSeries;
use crate::error::SftError;

/// One channel of an InsetChart/PropertyReport-shaped JSON report.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Channel {
    #[serde(rename = "Units", default)]
    pub units: String,
    #[serde(rename = "Data")]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Header {
    #[serde(rename = "Timestep", default)]
    pub timestep: f64,
    #[serde(rename = "Channels", default)]
    pub channel_count: usize,
}

/// The simulator's primary time-series artifact: channels of per-day values
/// keyed by name. Channel order follows the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChannelReport {
    #[serde(rename = "Header", default)]
    pub header: Header,
    #[serde(rename = "Channels")]
    pub channels: IndexMap<String, Channel>,
}

impl ChannelReport {
    /// Pulls one named channel out as an [`ObservedSeries`].
    ///
    /// # Errors
    /// - If the channel is absent from the report
    pub fn extract(&self, channel: &str) -> Result<ObservedSeries, SftError> {
        let Some(found) = self.channels.get(channel) else {
            let available = self
                .channels
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SftError::missing_data(format!(
                "channel `{channel}` absent (available: {available})"
            )));
        };
        Ok(ObservedSeries::new(channel, found.data.clone()))
    }
}

/// Reads a channel report from disk.
///
/// # Errors
/// - If the file does not exist (`MissingData`)
/// - If the JSON does not match the channel-report shape
pub fn load_channel_report(path: &Path) -> Result<ChannelReport, SftError> {
    if !path.exists() {
        return Err(SftError::missing_data(format!(
            "{} not found",
            path.display()
        )));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod test {
    use std::{fs::File, io::Write};

    use tempfile::tempdir;

    use super::load_channel_report;
    use crate::error::SftError;

    const INSET_CHART: &str = r#"
        {
            "Header": {"Timestep": 1.0, "Channels": 2},
            "Channels": {
                "Infected": {"Units": "people", "Data": [0.0, 3.0, 7.0]},
                "New Infections": {"Units": "people", "Data": [0.0, 3.0, 4.0]}
            }
        }
    "#;

    #[test]
    fn test_load_and_extract_channel() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("InsetChart.json");
        File::create(&path)
            .unwrap()
            .write_all(INSET_CHART.as_bytes())
            .unwrap();

        let report = load_channel_report(&path).unwrap();
        assert_eq!(report.channels.len(), 2);
        let series = report.extract("New Infections").unwrap();
        assert_eq!(series.values(), &[0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_channel_order_follows_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("InsetChart.json");
        File::create(&path)
            .unwrap()
            .write_all(INSET_CHART.as_bytes())
            .unwrap();

        let report = load_channel_report(&path).unwrap();
        let names: Vec<&String> = report.channels.keys().collect();
        assert_eq!(names, vec!["Infected", "New Infections"]);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("InsetChart.json");
        let e = load_channel_report(&path).err();
        match e {
            Some(SftError::MissingData(msg)) => {
                assert!(msg.ends_with("InsetChart.json not found"));
            }
            Some(ue) => panic!(
                "Expected a missing-data error for the absent report. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, loading passed with no errors."),
        }
    }

    #[test]
    fn test_missing_channel_lists_available() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("InsetChart.json");
        File::create(&path)
            .unwrap()
            .write_all(INSET_CHART.as_bytes())
            .unwrap();

        let report = load_channel_report(&path).unwrap();
        let e = report.extract("Susceptible Population").err();
        match e {
            Some(SftError::MissingData(msg)) => {
                assert_eq!(
                    msg,
                    "channel `Susceptible Population` absent (available: Infected, New Infections)"
                );
            }
            Some(ue) => panic!(
                "Expected a missing-data error for the absent channel. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, extraction passed with no errors."),
        }
    }
}
