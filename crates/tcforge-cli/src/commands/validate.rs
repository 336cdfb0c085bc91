//! The `tcforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use tcforge_core::parser::{parse_problem, validate_problem};

pub fn execute(problem_path: PathBuf) -> Result<()> {
    let problem = parse_problem(&problem_path)?;

    println!(
        "Problem: {} ({} test cases, {} subtasks)",
        problem.slug(),
        problem.test_cases().len(),
        problem.subtasks().len()
    );

    let warnings = validate_problem(&problem);
    for w in &warnings {
        let prefix = w
            .test_case
            .as_ref()
            .map(|name| format!("  [{name}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Problem is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
