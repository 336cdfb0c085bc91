//! Progress callbacks for long-running generation and grading.

use std::time::Duration;

use crate::report::TestCaseOutcome;

/// Trait for reporting progress during generation or grading.
pub trait ProgressReporter: Send + Sync {
    fn on_case_start(&self, name: &str);
    /// A test case was graded.
    fn on_case_scored(&self, outcome: &TestCaseOutcome);
    /// A test case's files were written; `with_output` is false when no
    /// expected output could be produced.
    fn on_case_generated(&self, name: &str, with_output: bool);
    fn on_case_error(&self, name: &str, error: &str);
    fn on_run_complete(&self, total: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_case_start(&self, _: &str) {}
    fn on_case_scored(&self, _: &TestCaseOutcome) {}
    fn on_case_generated(&self, _: &str, _: bool) {}
    fn on_case_error(&self, _: &str, _: &str) {}
    fn on_run_complete(&self, _: usize, _: usize, _: Duration) {}
}
