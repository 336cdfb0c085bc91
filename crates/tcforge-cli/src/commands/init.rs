//! The `tcforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("tcforge.toml").exists() {
        println!("tcforge.toml already exists, skipping.");
    } else {
        std::fs::write("tcforge.toml", SAMPLE_CONFIG)?;
        println!("Created tcforge.toml");
    }

    std::fs::create_dir_all("problems")?;
    let example_path = std::path::Path::new("problems/example.toml");
    if example_path.exists() {
        println!("problems/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PROBLEM)?;
        println!("Created problems/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: tcforge validate --problem problems/example.toml");
    println!("  2. Run: tcforge generate --problem problems/example.toml");
    println!("  3. Run: tcforge grade --problem problems/example.toml --solution ./solution");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# tcforge configuration

tc_dir = "tc"
eval_dir = ".tcforge/eval"
# reference_solution = "./reference"
fail_fast = false

[scorer]
type = "diff"
mode = "ignore_whitespace"

# [scorer]
# type = "custom"
# command = "./checker"
"#;

const EXAMPLE_PROBLEM: &str = r#"[problem]
slug = "sum-array"

[[subtasks]]
id = 1
points = 40.0

[[subtasks]]
id = 2
points = 60.0

[[input]]
kind = "line"
variables = [{ name = "N" }]

[[input]]
kind = "line"
variables = [{ name = "A", shape = "vector", size = "N" }]

[[output]]
kind = "line"
variables = [{ name = "S" }]

[[test_cases]]
name = "sample"
description = "the statement example"
subtasks = [1, 2]
input = { N = 3, A = [1, 2, 3] }
output = { S = 6 }

[[test_cases]]
name = "negatives"
subtasks = [2]
input = { N = 4, A = [-1, -2, 10, 0] }
output = { S = 7 }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_problem_parses_cleanly() {
        let problem = tcforge_core::parser::parse_problem_str(
            EXAMPLE_PROBLEM,
            std::path::Path::new("example.toml"),
        )
        .unwrap();
        assert!(tcforge_core::parser::validate_problem(&problem).is_empty());
    }
}
