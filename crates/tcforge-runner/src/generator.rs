//! Writing a problem's test files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use tcforge_core::error::ConfigError;
use tcforge_core::printer::IOVariablesPrinter;
use tcforge_core::problem::Problem;
use tcforge_core::progress::ProgressReporter;
use tcforge_core::testcase::TestCase;
use tcforge_core::traits::{ExecutionRequest, OperatingSystem};

use crate::evaluator::ERROR_FILENAME;

/// Where test files go and how missing outputs are produced.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub tc_dir: PathBuf,
    /// Command run on `<name>.in` for test cases without written output values.
    pub reference_solution: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tc_dir: PathBuf::from("tc"),
            reference_solution: None,
        }
    }
}

/// Where a test case's `.out` file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSource {
    /// Printed from the test case's output values.
    Values,
    /// Produced by the reference solution.
    ReferenceSolution,
    /// Nothing to produce it from.
    Missing,
    /// The reference solution failed; no `.out` was kept.
    Failed(String),
}

/// One generated test case.
#[derive(Debug, Clone)]
pub struct GeneratedCase {
    pub name: String,
    pub output: OutputSource,
}

/// What a generation run produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub cases: Vec<GeneratedCase>,
    pub duration_ms: u64,
}

impl GenerationSummary {
    /// Test cases whose reference solution failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cases.iter().filter_map(|c| match &c.output {
            OutputSource::Failed(message) => Some((c.name.as_str(), message.as_str())),
            _ => None,
        })
    }

    pub fn count(&self, source: &OutputSource) -> usize {
        self.cases.iter().filter(|c| &c.output == source).count()
    }
}

/// Prints every test case of a problem into `<tc_dir>/<name>.in` / `.out`.
pub struct Generator {
    os: Arc<dyn OperatingSystem>,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(os: Arc<dyn OperatingSystem>, config: GeneratorConfig) -> Self {
        Self { os, config }
    }

    /// Reset the test case directory and write every test case.
    ///
    /// Values that do not fit the formats abort the run. A failing reference
    /// solution is recorded for its test case and generation continues.
    pub async fn generate(
        &self,
        problem: &Problem,
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationSummary> {
        let start = Instant::now();
        let printer = problem.printer()?;
        self.os
            .force_make_dir(&self.config.tc_dir)
            .context("failed to prepare test case directory")?;

        let mut summary = GenerationSummary::default();
        for test_case in problem.test_cases() {
            progress.on_case_start(test_case.name());

            let input = test_case.input_path(&self.config.tc_dir);
            self.write(&input, |out| printer.print_input(test_case.input(), out))
                .with_context(|| format!("failed to write input of '{}'", test_case.name()))?;

            let output = self.produce_output(&printer, test_case).await?;
            match &output {
                OutputSource::Failed(message) => {
                    tracing::error!(
                        test_case = test_case.name(),
                        "reference solution failed: {}",
                        message
                    );
                    progress.on_case_error(test_case.name(), message);
                }
                OutputSource::Missing => {
                    tracing::warn!(test_case = test_case.name(), "no expected output");
                }
                _ => {}
            }
            progress.on_case_generated(
                test_case.name(),
                matches!(output, OutputSource::Values | OutputSource::ReferenceSolution),
            );
            summary.cases.push(GeneratedCase {
                name: test_case.name().to_string(),
                output,
            });
        }

        let elapsed = start.elapsed();
        let failed = summary.failures().count();
        progress.on_run_complete(summary.cases.len(), failed, elapsed);
        summary.duration_ms = elapsed.as_millis() as u64;
        tracing::info!(
            problem = problem.slug(),
            test_cases = summary.cases.len(),
            failed,
            "generated"
        );
        Ok(summary)
    }

    async fn produce_output(
        &self,
        printer: &IOVariablesPrinter,
        test_case: &TestCase,
    ) -> Result<OutputSource> {
        let output = test_case.output_path(&self.config.tc_dir);

        if let Some(values) = test_case.output() {
            self.write(&output, |out| printer.print_output(values, out))
                .with_context(|| format!("failed to write output of '{}'", test_case.name()))?;
            return Ok(OutputSource::Values);
        }

        let Some(solution) = &self.config.reference_solution else {
            return Ok(OutputSource::Missing);
        };

        let request = ExecutionRequest::new(solution.as_str())
            .input(test_case.input_path(&self.config.tc_dir))
            .output(&output)
            .error(self.config.tc_dir.join(ERROR_FILENAME));
        let failure = match self.os.execute(&request).await {
            Ok(result) if result.is_success() => return Ok(OutputSource::ReferenceSolution),
            Ok(result) => result.failure_message(),
            Err(e) => format!("{e:#}"),
        };
        self.os.remove_file(&output);
        Ok(OutputSource::Failed(failure))
    }

    fn write(
        &self,
        path: &Path,
        print: impl FnOnce(&mut dyn Write) -> Result<(), ConfigError>,
    ) -> Result<()> {
        let mut stream = self.os.open_for_writing(path)?;
        print(&mut stream)?;
        self.os.close_opened_writing_stream(stream)
    }
}
