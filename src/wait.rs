use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use humantime::format_duration;
use tracing::{debug, info};

use crate::error::SftError;
use crate::parameters::WaitSettings;

/// Blocks until the external simulator writes its done-marker file into the
/// output directory, polling at the configured interval. The wall-clock
/// ceiling is mandatory: exceeding it is a `MissingData` failure, not a
/// silent continuation with partial output.
///
/// # Errors
/// - If the marker does not appear before `settings.timeout_secs` elapses
pub fn wait_for_done(output_directory: &Path, settings: &WaitSettings) -> Result<Duration, SftError> {
    let marker = output_directory.join(&settings.done_marker);
    let ceiling = Duration::from_secs_f64(settings.timeout_secs);
    let interval = Duration::from_secs_f64(settings.poll_interval_secs);
    let start = Instant::now();

    loop {
        if marker.exists() {
            let elapsed = start.elapsed();
            info!(
                "simulator finished; `{}` appeared after {}",
                marker.display(),
                format_duration(elapsed)
            );
            return Ok(elapsed);
        }
        if start.elapsed() >= ceiling {
            return Err(SftError::missing_data(format!(
                "simulator did not write `{}` within {}",
                marker.display(),
                format_duration(ceiling)
            )));
        }
        debug!("`{}` not present yet; sleeping", marker.display());
        thread::sleep(interval.min(ceiling.saturating_sub(start.elapsed())));
    }
}

#[cfg(test)]
mod test {
    use std::{fs::File, path::PathBuf};

    use tempfile::tempdir;

    use super::wait_for_done;
    use crate::error::SftError;
    use crate::parameters::WaitSettings;

    #[test]
    fn test_marker_already_present() {
        let temp_dir = tempdir().unwrap();
        File::create(temp_dir.path().join("status.txt")).unwrap();
        let settings = WaitSettings::default();
        wait_for_done(temp_dir.path(), &settings).unwrap();
    }

    #[test]
    fn test_timeout_is_a_defined_failure() {
        let temp_dir = tempdir().unwrap();
        let settings = WaitSettings {
            done_marker: PathBuf::from("status.txt"),
            poll_interval_secs: 0.01,
            timeout_secs: 0.05,
        };
        let e = wait_for_done(temp_dir.path(), &settings).err();
        match e {
            Some(SftError::MissingData(msg)) => {
                assert!(msg.contains("did not write"));
            }
            Some(ue) => panic!(
                "Expected a missing-data error for the absent marker. Instead got {:?}",
                ue.to_string()
            ),
            None => panic!("Expected an error. Instead, the wait returned with no errors."),
        }
    }
}
