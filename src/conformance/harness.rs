//! Outcome bookkeeping for differential units.

use super::repro::ReproBundle;

/// Outcome of one differential unit.
#[derive(Debug)]
pub enum UnitOutcome {
    /// The result was equivalent to the reference decode.
    Pass,
    /// The result diverged from the reference decode.
    Fail {
        /// Everything needed to localize the divergence.
        repro: Box<ReproBundle>,
    },
    /// The codec does not provide the slot under test.
    Skip {
        /// Why the unit did not run.
        reason: String,
    },
    /// The codec, or the reference decode of its output, returned an error.
    Error {
        /// Error message.
        message: String,
    },
}

impl UnitOutcome {
    /// Check if the unit passed.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Check if the unit diverged.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// Results from running a batch of differential units.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of units that passed.
    pub passed: usize,
    /// Number of units that failed.
    pub failed: usize,
    /// Number of units that were skipped.
    pub skipped: usize,
    /// Number of units that errored.
    pub errors: usize,
    /// Details of failures.
    pub failures: Vec<FailureDetail>,
    /// Details of errors.
    pub error_details: Vec<ErrorDetail>,
}

/// Details about a unit failure.
#[derive(Debug)]
pub struct FailureDetail {
    /// Unit name.
    pub name: String,
    /// Repro bundle.
    pub repro: Box<ReproBundle>,
}

/// Details about a unit error.
#[derive(Debug)]
pub struct ErrorDetail {
    /// Unit name.
    pub name: String,
    /// Error message.
    pub message: String,
}

impl BatchResult {
    /// Create a new empty batch result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a unit.
    pub fn record(&mut self, name: &str, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Pass => self.passed += 1,
            UnitOutcome::Fail { repro } => {
                self.failed += 1;
                self.failures.push(FailureDetail {
                    name: name.to_string(),
                    repro,
                });
            }
            UnitOutcome::Skip { .. } => self.skipped += 1,
            UnitOutcome::Error { message } => {
                self.errors += 1;
                self.error_details.push(ErrorDetail {
                    name: name.to_string(),
                    message,
                });
            }
        }
    }

    /// Check if all units passed or were skipped.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get total number of units run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errors
    }

    /// Names of failed and errored units, in run order of each kind.
    pub fn problem_names(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.error_details.iter().map(|e| e.name.as_str()))
            .collect()
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped, {} errors (total: {})",
            self.passed,
            self.failed,
            self.skipped,
            self.errors,
            self.total()
        )
    }
}
