//! Grading a solution against generated test files.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use tcforge_core::problem::Problem;
use tcforge_core::progress::ProgressReporter;
use tcforge_core::report::{EvaluationReport, TestCaseOutcome};
use tcforge_core::results::ScoringResult;
use tcforge_core::testcase::TestCase;
use tcforge_core::traits::{ExecutionRequest, OperatingSystem, Scorer};

/// Capture channel for a solution's stderr, inside the eval directory.
pub const ERROR_FILENAME: &str = "_error.out";

/// Where the evaluator reads test files and writes candidate outputs.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub tc_dir: PathBuf,
    pub eval_dir: PathBuf,
    /// Stop at the first infrastructural failure.
    pub fail_fast: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tc_dir: PathBuf::from("tc"),
            eval_dir: PathBuf::from(".tcforge/eval"),
            fail_fast: false,
        }
    }
}

impl EvaluatorConfig {
    /// Fails when `eval_dir` and `tc_dir` overlap. Grading resets `eval_dir`,
    /// so it must neither be `tc_dir` nor contain it nor sit inside it.
    pub fn validate(&self) -> Result<()> {
        let tc_dir = absolute(&self.tc_dir)?;
        let eval_dir = absolute(&self.eval_dir)?;
        if tc_dir.starts_with(&eval_dir) || eval_dir.starts_with(&tc_dir) {
            anyhow::bail!(
                "eval_dir `{}` overlaps tc_dir `{}`",
                self.eval_dir.display(),
                self.tc_dir.display()
            );
        }
        Ok(())
    }
}

// Lexically normalized absolute path.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to read the current directory")?
            .join(path)
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Runs solutions on test cases and scores what they print.
pub struct Evaluator {
    os: Arc<dyn OperatingSystem>,
    scorer: Arc<dyn Scorer>,
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(
        os: Arc<dyn OperatingSystem>,
        scorer: Arc<dyn Scorer>,
        config: EvaluatorConfig,
    ) -> Self {
        Self { os, scorer, config }
    }

    /// Run `solution` on one test case and score its output.
    ///
    /// The eval directory must already exist. A crashing solution is a
    /// `RuntimeError` result; `Err` means the grading itself failed.
    pub async fn evaluate(&self, test_case: &TestCase, solution: &str) -> Result<ScoringResult> {
        let input = test_case.input_path(&self.config.tc_dir);
        let candidate = test_case.output_path(&self.config.eval_dir);
        let request = ExecutionRequest::new(solution)
            .input(&input)
            .output(&candidate)
            .error(self.config.eval_dir.join(ERROR_FILENAME));

        let result = self
            .os
            .execute(&request)
            .await
            .with_context(|| format!("failed to run solution on '{}'", test_case.name()))?;

        if !result.is_success() {
            return Ok(ScoringResult::runtime_error(result.failure_message()));
        }

        let reference = test_case.output_path(&self.config.tc_dir);
        let scored = self
            .scorer
            .score(&input, &candidate, &reference)
            .await
            .with_context(|| {
                format!(
                    "{} scorer failed on '{}'",
                    self.scorer.name(),
                    test_case.name()
                )
            })?;
        Ok(scored)
    }

    /// Grade `solution` on every test case of `problem`, in order.
    pub async fn grade(
        &self,
        problem: &Problem,
        solution: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<EvaluationReport> {
        let start = Instant::now();
        self.config.validate()?;
        self.os
            .force_make_dir(&self.config.eval_dir)
            .context("failed to prepare eval directory")?;

        let total = problem.test_cases().len();
        let mut results = Vec::with_capacity(total);
        let mut failed = 0usize;

        for test_case in problem.test_cases() {
            progress.on_case_start(test_case.name());
            let case_start = Instant::now();
            let subtasks: Vec<i32> = test_case.subtask_ids().iter().copied().collect();

            let outcome = match self.evaluate(test_case, solution).await {
                Ok(result) => TestCaseOutcome::scored(test_case.name(), subtasks, result),
                Err(e) => {
                    let message = format!("{e:#}");
                    tracing::error!(test_case = test_case.name(), "grading failed: {}", message);
                    progress.on_case_error(test_case.name(), &message);
                    TestCaseOutcome::infrastructure_failure(test_case.name(), subtasks, message)
                }
            }
            .with_duration_ms(case_start.elapsed().as_millis() as u64);

            tracing::info!(
                test_case = test_case.name(),
                verdict = outcome.result.verdict.code(),
                "graded"
            );
            if !outcome.result.is_accepted() {
                failed += 1;
            }
            progress.on_case_scored(&outcome);

            let stop = self.config.fail_fast && outcome.infrastructure;
            results.push(outcome);
            if stop {
                tracing::warn!("stopping after infrastructure failure (fail_fast)");
                break;
            }
        }

        let elapsed = start.elapsed();
        progress.on_run_complete(total, failed, elapsed);

        Ok(EvaluationReport::build(
            problem,
            solution,
            results,
            elapsed.as_millis() as u64,
        ))
    }
}
