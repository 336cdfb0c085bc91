//! A problem: its formats, subtasks, and test cases.

use std::collections::{BTreeSet, HashSet};

use crate::error::ConfigError;
use crate::format::{Direction, IOFormat};
use crate::printer::{expect_direction, IOVariablesPrinter};
use crate::testcase::{Subtask, TestCase, MAIN_ID};

/// A validated problem definition.
#[derive(Debug, Clone)]
pub struct Problem {
    slug: String,
    input_format: IOFormat,
    output_format: Option<IOFormat>,
    subtasks: Vec<Subtask>,
    test_cases: Vec<TestCase>,
}

impl Problem {
    /// Validate and assemble a problem.
    ///
    /// With no declared subtasks, every test case must belong to the implicit
    /// main subtask ([`MAIN_ID`]).
    pub fn new(
        slug: impl Into<String>,
        input_format: IOFormat,
        output_format: Option<IOFormat>,
        subtasks: Vec<Subtask>,
        test_cases: Vec<TestCase>,
    ) -> Result<Self, ConfigError> {
        expect_direction(&input_format, Direction::Input)?;
        if let Some(output_format) = &output_format {
            expect_direction(output_format, Direction::Output)?;
        }

        let subtasks = if subtasks.is_empty() {
            vec![Subtask::main()]
        } else {
            subtasks
        };
        let mut ids = BTreeSet::new();
        for subtask in &subtasks {
            if !ids.insert(subtask.id) {
                return Err(ConfigError::DuplicateSubtask(subtask.id));
            }
        }

        let mut names = HashSet::new();
        for tc in &test_cases {
            if !names.insert(tc.name()) {
                return Err(ConfigError::DuplicateTestCase(tc.name().to_string()));
            }
            if let Some(&unknown) = tc.subtask_ids().iter().find(|&&id| !ids.contains(&id)) {
                return Err(ConfigError::UnknownSubtask {
                    test_case: tc.name().to_string(),
                    subtask: unknown,
                });
            }
        }

        Ok(Self {
            slug: slug.into(),
            input_format,
            output_format,
            subtasks,
            test_cases,
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn input_format(&self) -> &IOFormat {
        &self.input_format
    }

    pub fn output_format(&self) -> Option<&IOFormat> {
        self.output_format.as_ref()
    }

    /// Declared subtasks, or the implicit main subtask when none were declared.
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    pub fn test_case(&self, name: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| tc.name() == name)
    }

    /// Test cases counting toward the given subtask.
    pub fn test_cases_in(&self, subtask_id: i32) -> impl Iterator<Item = &TestCase> {
        self.test_cases
            .iter()
            .filter(move |tc| tc.subtask_ids().contains(&subtask_id))
    }

    /// True when the problem declares no subtasks of its own.
    pub fn has_implicit_subtask(&self) -> bool {
        self.subtasks.len() == 1 && self.subtasks[0].id == MAIN_ID
    }

    /// Sum of all subtask points.
    pub fn max_score(&self) -> f64 {
        self.subtasks.iter().map(|s| s.points).sum()
    }

    /// A printer over this problem's formats, with the default printers.
    pub fn printer(&self) -> Result<IOVariablesPrinter, ConfigError> {
        IOVariablesPrinter::new(self.input_format.clone(), self.output_format.clone())
    }
}
