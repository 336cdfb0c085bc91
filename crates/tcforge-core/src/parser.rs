//! TOML problem parser.
//!
//! Loads a problem definition (formats, subtasks, test cases) from a TOML
//! file, and validates it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::format::{IOFormat, IOFormatBuilder, IOSegment, IOSegmentKind};
use crate::problem::Problem;
use crate::testcase::{Subtask, TestCaseBuilder};
use crate::variable::{Scalar, SizeExpr, Value, Values, Variable, VariableShape};

/// Intermediate TOML structure for parsing problem files.
#[derive(Debug, Deserialize)]
struct TomlProblemFile {
    problem: TomlProblemHeader,
    #[serde(default)]
    subtasks: Vec<TomlSubtask>,
    #[serde(default)]
    input: Vec<TomlSegment>,
    #[serde(default)]
    output: Vec<TomlSegment>,
    #[serde(default)]
    test_cases: Vec<TomlTestCase>,
}

#[derive(Debug, Deserialize)]
struct TomlProblemHeader {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct TomlSubtask {
    id: i32,
    points: f64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TomlSegment {
    Line {
        #[serde(default)]
        variables: Vec<TomlVariable>,
    },
    Lines {
        size: TomlSize,
        variables: Vec<TomlVariable>,
    },
    RawLine {
        variable: String,
    },
    RawLines {
        variable: String,
        #[serde(default)]
        size: Option<TomlSize>,
    },
    Grid {
        variable: String,
        rows: TomlSize,
        columns: TomlSize,
    },
}

#[derive(Debug, Deserialize)]
struct TomlVariable {
    name: String,
    #[serde(default)]
    shape: TomlShape,
    #[serde(default)]
    size: Option<TomlSize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TomlShape {
    #[default]
    Scalar,
    Vector,
    Matrix,
}

/// A size written either as a number or as a variable name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlSize {
    Count(usize),
    Expr(String),
}

#[derive(Debug, Deserialize)]
struct TomlTestCase {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subtasks: Vec<i32>,
    #[serde(default)]
    input: Values,
    #[serde(default)]
    output: Option<Values>,
}

/// Parse a problem file.
pub fn parse_problem(path: &Path) -> Result<Problem> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read problem file: {}", path.display()))?;

    parse_problem_str(&content, path)
}

/// Parse a TOML string into a `Problem` (useful for testing).
pub fn parse_problem_str(content: &str, source_path: &Path) -> Result<Problem> {
    let parsed: TomlProblemFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let input_format = build_format(parsed.input, IOFormatBuilder::new().prepare_for_input_format())
        .context("invalid input format")?;
    let output_format = if parsed.output.is_empty() {
        None
    } else {
        Some(
            build_format(parsed.output, IOFormatBuilder::new().prepare_for_output_format())
                .context("invalid output format")?,
        )
    };

    let input_grids = grid_variables(&input_format);
    let output_grids = output_format
        .as_ref()
        .map(grid_variables)
        .unwrap_or_default();

    let test_cases = parsed
        .test_cases
        .into_iter()
        .map(|c| {
            let name = c.name.clone();
            let mut builder = TestCaseBuilder::new()
                .set_name(c.name)
                .set_subtask_ids(c.subtasks)
                .set_input(expand_char_grids(c.input, &input_grids));
            if let Some(description) = c.description {
                builder = builder.set_description(description);
            }
            if let Some(output) = c.output {
                builder = builder.set_output(expand_char_grids(output, &output_grids));
            }
            builder
                .build()
                .with_context(|| format!("invalid test case '{name}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let subtasks = parsed
        .subtasks
        .into_iter()
        .map(|s| Subtask::new(s.id, s.points))
        .collect();

    let problem = Problem::new(
        parsed.problem.slug,
        input_format,
        output_format,
        subtasks,
        test_cases,
    )
    .with_context(|| format!("invalid problem: {}", source_path.display()))?;

    tracing::debug!(
        slug = problem.slug(),
        test_cases = problem.test_cases().len(),
        "parsed problem"
    );
    Ok(problem)
}

fn build_format(segments: Vec<TomlSegment>, mut builder: IOFormatBuilder) -> Result<IOFormat> {
    for segment in segments {
        builder = builder.add_io_segment(build_segment(segment)?);
    }
    Ok(builder.build()?)
}

fn build_segment(segment: TomlSegment) -> Result<IOSegment> {
    let segment = match segment {
        TomlSegment::Line { variables } => IOSegment::line(build_variables(variables)?)?,
        TomlSegment::Lines { size, variables } => {
            IOSegment::lines(size_expr(size)?, build_variables(variables)?)?
        }
        TomlSegment::RawLine { variable } => IOSegment::raw_line(variable)?,
        TomlSegment::RawLines { variable, size } => {
            IOSegment::raw_lines(variable, size.map(size_expr).transpose()?)?
        }
        TomlSegment::Grid {
            variable,
            rows,
            columns,
        } => IOSegment::grid(variable, size_expr(rows)?, size_expr(columns)?)?,
    };
    Ok(segment)
}

fn build_variables(variables: Vec<TomlVariable>) -> Result<Vec<Variable>> {
    variables
        .into_iter()
        .map(|v| -> Result<Variable> {
            let shape = match (v.shape, v.size) {
                (TomlShape::Scalar, None) => VariableShape::Scalar,
                (TomlShape::Vector, size) => VariableShape::Vector {
                    size: size.map(size_expr).transpose()?,
                },
                (TomlShape::Matrix, None) => VariableShape::Matrix,
                (_, Some(_)) => {
                    anyhow::bail!("variable '{}': only vectors take a size", v.name)
                }
            };
            Ok(Variable::new(v.name, shape))
        })
        .collect()
}

fn size_expr(size: TomlSize) -> Result<SizeExpr> {
    match size {
        TomlSize::Count(n) => Ok(SizeExpr::Fixed(n)),
        TomlSize::Expr(s) => s.parse().map_err(|e: String| anyhow::anyhow!("{}", e)),
    }
}

fn grid_variables(format: &IOFormat) -> HashSet<String> {
    format
        .segments()
        .iter()
        .filter(|s| s.kind() == IOSegmentKind::Grid)
        .flat_map(|s| s.variables().iter().map(|v| v.name().to_string()))
        .collect()
}

// A grid written as an array of strings is a char matrix.
fn expand_char_grids(values: Values, grids: &HashSet<String>) -> Values {
    values
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Vector(rows) if grids.contains(name) && is_string_rows(rows) => {
                    Value::char_grid(rows.iter().filter_map(Scalar::as_str))
                }
                other => other.clone(),
            };
            (name.to_string(), value)
        })
        .collect()
}

fn is_string_rows(rows: &[Scalar]) -> bool {
    !rows.is_empty() && rows.iter().all(|row| row.as_str().is_some())
}

/// A warning from problem validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The test case name (if applicable).
    pub test_case: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a problem for issues that parse-time checks cannot see.
pub fn validate_problem(problem: &Problem) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if problem.test_cases().is_empty() {
        warnings.push(ValidationWarning {
            test_case: None,
            message: "problem has no test cases".into(),
        });
    }

    for subtask in problem.subtasks() {
        if problem.test_cases_in(subtask.id).next().is_none() && !problem.test_cases().is_empty()
        {
            warnings.push(ValidationWarning {
                test_case: None,
                message: format!("subtask {} has no test cases", subtask.id),
            });
        }
    }

    let printer = match problem.printer() {
        Ok(printer) => printer,
        Err(e) => {
            warnings.push(ValidationWarning {
                test_case: None,
                message: format!("formats cannot be printed: {e}"),
            });
            return warnings;
        }
    };

    // Dry-run every print the generator would do.
    for tc in problem.test_cases() {
        if let Err(e) = printer.print_input(tc.input(), &mut std::io::sink()) {
            warnings.push(ValidationWarning {
                test_case: Some(tc.name().to_string()),
                message: format!("input cannot be printed: {e}"),
            });
        }
        if let Some(output) = tc.output() {
            if let Err(e) = printer.print_output(output, &mut std::io::sink()) {
                warnings.push(ValidationWarning {
                    test_case: Some(tc.name().to_string()),
                    message: format!("output cannot be printed: {e}"),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::testcase::MAIN_ID;

    const SUM_ARRAY: &str = r#"
[problem]
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
name = "small_1"
subtasks = [1, 2]
input = { N = 3, A = [1, 2, 3] }
output = { S = 6 }

[[test_cases]]
name = "large_1"
description = "many elements"
subtasks = [2]
input = { N = 4, A = [10, 20, 30, 40] }
"#;

    fn parse(toml: &str) -> Result<Problem> {
        parse_problem_str(toml, &PathBuf::from("problem.toml"))
    }

    #[test]
    fn parse_valid_toml() {
        let problem = parse(SUM_ARRAY).unwrap();
        assert_eq!(problem.slug(), "sum-array");
        assert_eq!(problem.subtasks().len(), 2);
        assert_eq!(problem.test_cases().len(), 2);
        assert_eq!(problem.input_format().segments().len(), 2);
        assert!(problem.output_format().is_some());

        let printer = problem.printer().unwrap();
        let small = problem.test_case("small_1").unwrap();
        assert_eq!(printer.render_input(small.input()).unwrap(), "3\n1 2 3\n");
        assert_eq!(
            printer.render_output(small.output().unwrap()).unwrap(),
            "6\n"
        );

        let large = problem.test_case("large_1").unwrap();
        assert_eq!(large.description(), Some("many elements"));
        assert!(large.output().is_none());
    }

    #[test]
    fn parse_without_subtasks_or_output() {
        let toml = r#"
[problem]
slug = "echo"

[[input]]
kind = "raw_line"
variable = "S"

[[test_cases]]
name = "t1"
input = { S = "hello world" }
"#;
        let problem = parse(toml).unwrap();
        assert!(problem.output_format().is_none());
        assert!(problem.has_implicit_subtask());
        assert!(problem.test_cases()[0].subtask_ids().contains(&MAIN_ID));
        let printer = problem.printer().unwrap();
        assert_eq!(
            printer.render_input(problem.test_cases()[0].input()).unwrap(),
            "hello world\n"
        );
    }

    #[test]
    fn parse_grid_of_strings_as_chars() {
        let toml = r##"
[problem]
slug = "maze"

[[input]]
kind = "line"
variables = [{ name = "R" }, { name = "C" }]

[[input]]
kind = "grid"
variable = "G"
rows = "R"
columns = "C"

[[test_cases]]
name = "t1"
input = { R = 2, C = 3, G = ["#..", ".#."] }
"##;
        let problem = parse(toml).unwrap();
        let tc = &problem.test_cases()[0];
        assert!(matches!(tc.input().get("G"), Some(Value::Matrix(_))));
        let printer = problem.printer().unwrap();
        assert_eq!(printer.render_input(tc.input()).unwrap(), "2 3\n#..\n.#.\n");
    }

    #[test]
    fn parse_lines_and_raw_lines() {
        let toml = r#"
[problem]
slug = "edges"

[[input]]
kind = "line"
variables = [{ name = "M" }]

[[input]]
kind = "lines"
size = "M"
variables = [
    { name = "U", shape = "vector" },
    { name = "W", shape = "matrix" },
]

[[input]]
kind = "raw_lines"
variable = "L"
size = 2

[[test_cases]]
name = "t1"
input = { M = 2, U = [1, 2], W = [[5, 6], [7]], L = ["a b", "c"] }
"#;
        let problem = parse(toml).unwrap();
        let printer = problem.printer().unwrap();
        assert_eq!(
            printer
                .render_input(problem.test_cases()[0].input())
                .unwrap(),
            "2\n1 5 6\n2 7\na b\nc\n"
        );
    }

    #[test]
    fn unknown_segment_kind_rejected() {
        let toml = r#"
[problem]
slug = "bad"

[[input]]
kind = "spiral"
variable = "X"
"#;
        assert!(parse(toml).is_err());
    }

    #[test]
    fn missing_input_format_rejected() {
        let toml = r#"
[problem]
slug = "bad"
"#;
        let err = parse(toml).unwrap_err();
        assert!(format!("{err:#}").contains("input format"));
    }

    #[test]
    fn size_on_scalar_rejected() {
        let toml = r#"
[problem]
slug = "bad"

[[input]]
kind = "line"
variables = [{ name = "N", size = 3 }]
"#;
        assert!(parse(toml).is_err());
    }

    #[test]
    fn unknown_subtask_rejected() {
        let toml = r#"
[problem]
slug = "bad"

[[subtasks]]
id = 1
points = 100.0

[[input]]
kind = "line"
variables = [{ name = "N" }]

[[test_cases]]
name = "t1"
subtasks = [3]
input = { N = 1 }
"#;
        let err = parse(toml).unwrap_err();
        assert!(format!("{err:#}").contains("unknown subtask 3"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.toml");
        std::fs::write(&path, SUM_ARRAY).unwrap();
        let problem = parse_problem(&path).unwrap();
        assert_eq!(problem.slug(), "sum-array");

        assert!(parse_problem(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn validate_clean_problem() {
        let problem = parse(SUM_ARRAY).unwrap();
        assert!(validate_problem(&problem).is_empty());
    }

    #[test]
    fn validate_reports_unprintable_values_and_empty_subtasks() {
        let toml = r#"
[problem]
slug = "warn"

[[subtasks]]
id = 1
points = 50.0

[[subtasks]]
id = 2
points = 50.0

[[input]]
kind = "line"
variables = [{ name = "N" }, { name = "A", shape = "vector", size = "N" }]

[[test_cases]]
name = "short"
subtasks = [1]
input = { N = 3, A = [1, 2] }
output = { S = 3 }
"#;
        let problem = parse(toml).unwrap();
        let warnings = validate_problem(&problem);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("subtask 2 has no test cases")));
        assert!(warnings.iter().any(|w| {
            w.test_case.as_deref() == Some("short") && w.message.contains("input cannot")
        }));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("output cannot be printed")));
    }

    #[test]
    fn validate_no_test_cases() {
        let toml = r#"
[problem]
slug = "empty"

[[input]]
kind = "line"
variables = [{ name = "N" }]
"#;
        let problem = parse(toml).unwrap();
        let warnings = validate_problem(&problem);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("no test cases"));
    }
}
