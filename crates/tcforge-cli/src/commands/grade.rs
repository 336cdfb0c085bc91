//! The `tcforge grade` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use tcforge_core::parser::parse_problem;
use tcforge_core::progress::ProgressReporter;
use tcforge_core::report::{EvaluationReport, TestCaseOutcome};
use tcforge_core::testcase::MAIN_ID;
use tcforge_core::traits::OperatingSystem;
use tcforge_runner::{create_scorer, load_config_from, Evaluator, LocalOperatingSystem};

/// Longest message excerpt shown in the summary table.
const MAX_MESSAGE: usize = 60;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_case_start(&self, _: &str) {}

    fn on_case_scored(&self, outcome: &TestCaseOutcome) {
        eprintln!(
            "  {} {} ({}ms)",
            outcome.result.verdict.code(),
            outcome.name,
            outcome.duration_ms
        );
    }

    fn on_case_generated(&self, _: &str, _: bool) {}

    fn on_case_error(&self, name: &str, error: &str) {
        eprintln!("  ERROR: {name}: {error}");
    }

    fn on_run_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {failed} of {total} test cases not accepted ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    problem_path: PathBuf,
    solution: String,
    config_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let problem = parse_problem(&problem_path)?;

    let os: Arc<dyn OperatingSystem> = Arc::new(LocalOperatingSystem);
    let scorer = create_scorer(&config.scorer, os.clone(), &config.eval_dir);
    let evaluator = Evaluator::new(os, scorer, config.evaluator_config());

    eprintln!(
        "tcforge v{}: grading `{}` on {} test cases of {}",
        env!("CARGO_PKG_VERSION"),
        solution,
        problem.test_cases().len(),
        problem.slug()
    );
    eprintln!();

    let report = evaluator.grade(&problem, &solution, &ConsoleReporter).await?;

    print_summary(&report);

    let path = report_path.unwrap_or_else(|| {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        PathBuf::from(".tcforge")
            .join("reports")
            .join(format!("report-{timestamp}.json"))
    });
    report.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    if strict && !report.all_accepted() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let mut cases = Table::new();
    cases.set_header(vec!["Test case", "Subtasks", "Verdict", "Time", "Message"]);
    for outcome in &report.results {
        let subtasks = outcome
            .subtasks
            .iter()
            .filter(|&&id| id != MAIN_ID)
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        cases.add_row(vec![
            Cell::new(&outcome.name),
            Cell::new(subtasks),
            Cell::new(outcome.result.verdict),
            Cell::new(format!("{}ms", outcome.duration_ms)),
            Cell::new(excerpt(outcome.result.message.as_deref().unwrap_or(""))),
        ]);
    }
    println!("{cases}");

    let mut subtasks = Table::new();
    subtasks.set_header(vec!["Subtask", "Verdict", "Score"]);
    for summary in &report.subtasks {
        let id = if summary.id == MAIN_ID {
            "main".to_string()
        } else {
            summary.id.to_string()
        };
        subtasks.add_row(vec![
            Cell::new(id),
            Cell::new(summary.verdict),
            Cell::new(format!("{:.2}/{:.2}", summary.earned, summary.points)),
        ]);
    }
    println!("{subtasks}");

    let counts = report
        .verdict_counts()
        .iter()
        .map(|(verdict, n)| format!("{} {n}", verdict.code()))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Verdicts: {counts}");
    println!(
        "Total: {:.2}/{:.2}",
        report.total_score, report.max_score
    );

    let broken: Vec<&str> = report
        .infrastructure_failures()
        .map(|o| o.name.as_str())
        .collect();
    if !broken.is_empty() {
        eprintln!(
            "Warning: grading failed on {} test case(s): {}",
            broken.len(),
            broken.join(", ")
        );
    }
}

// First line of a message, shortened for the table.
fn excerpt(message: &str) -> String {
    let line = message.lines().next().unwrap_or("");
    if line.chars().count() > MAX_MESSAGE {
        let head: String = line.chars().take(MAX_MESSAGE).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
