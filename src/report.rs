//! The plain-text pass/fail report: one `GOOD:`/`BAD:`/`INVALID:` line per
//! check and a single final `SUMMARY: Success=<bool>` line. Downstream
//! automation greps this file, so the format is fixed.

use std::{fs::File, io::Write, path::Path};

use crate::error::SftError;
use crate::stats::{CheckOutcome, ComparisonResult};

#[derive(Debug, Default)]
pub struct Reporter {
    lines: Vec<(CheckOutcome, String)>,
}

impl Reporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished check under its configured name.
    pub fn record(&mut self, name: &str, result: &ComparisonResult) {
        self.lines
            .push((result.outcome, format!("{name}: {}", result.explanation)));
    }

    /// Records a check that could not run because its input artifact was
    /// absent or the simulator never finished.
    pub fn record_no_test_data(&mut self, name: &str, detail: &str) {
        self.lines
            .push((CheckOutcome::Fail, format!("{name}: no test data ({detail})")));
    }

    /// The run succeeds iff at least one check passed and none failed.
    /// Inconclusive checks count toward neither side.
    #[must_use]
    pub fn success(&self) -> bool {
        let any_good = self
            .lines
            .iter()
            .any(|(outcome, _)| *outcome == CheckOutcome::Pass);
        let any_bad = self
            .lines
            .iter()
            .any(|(outcome, _)| *outcome == CheckOutcome::Fail);
        any_good && !any_bad
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        for (outcome, line) in &self.lines {
            let prefix = match outcome {
                CheckOutcome::Pass => "GOOD",
                CheckOutcome::Fail => "BAD",
                CheckOutcome::Inconclusive => "INVALID",
            };
            text.push_str(prefix);
            text.push_str(": ");
            text.push_str(line);
            text.push('\n');
        }
        // Python's str(bool) capitalization; downstream tooling greps for
        // this exact line.
        let success = if self.success() { "True" } else { "False" };
        text.push_str(&format!("SUMMARY: Success={success}\n"));
        text
    }

    /// Writes the report to its fixed-name file in the output directory.
    ///
    /// # Errors
    /// - If the file cannot be created or written
    pub fn write(&self, path: &Path) -> Result<(), SftError> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}
