//! The `tcforge generate` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use tcforge_core::parser::parse_problem;
use tcforge_core::progress::ProgressReporter;
use tcforge_core::report::TestCaseOutcome;
use tcforge_runner::generator::OutputSource;
use tcforge_runner::{load_config_from, Generator, LocalOperatingSystem};

/// Console progress reporter for generation.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_case_start(&self, _: &str) {}

    fn on_case_scored(&self, _: &TestCaseOutcome) {}

    fn on_case_generated(&self, name: &str, with_output: bool) {
        if with_output {
            eprintln!("  Wrote: {name}.in {name}.out");
        } else {
            eprintln!("  Wrote: {name}.in (no expected output)");
        }
    }

    fn on_case_error(&self, name: &str, error: &str) {
        eprintln!("  ERROR: {name}: {error}");
    }

    fn on_run_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {total} test cases written, {failed} without expected output ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    problem_path: PathBuf,
    config_path: Option<PathBuf>,
    solution: Option<String>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if solution.is_some() {
        config.reference_solution = solution;
    }
    let problem = parse_problem(&problem_path)?;

    eprintln!(
        "tcforge v{}: generating {} test cases for {} into {}",
        env!("CARGO_PKG_VERSION"),
        problem.test_cases().len(),
        problem.slug(),
        config.tc_dir.display()
    );
    eprintln!();

    let generator = Generator::new(Arc::new(LocalOperatingSystem), config.generator_config());
    let summary = generator.generate(&problem, &ConsoleReporter).await?;

    println!(
        "Generated {} test cases in {} ({} from values, {} from reference solution, {} without output)",
        summary.cases.len(),
        config.tc_dir.display(),
        summary.count(&OutputSource::Values),
        summary.count(&OutputSource::ReferenceSolution),
        summary.count(&OutputSource::Missing),
    );

    let failed = summary.failures().count();
    anyhow::ensure!(
        failed == 0,
        "reference solution failed on {failed} test case(s)"
    );

    Ok(())
}
