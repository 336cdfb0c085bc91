//! Test cases and subtasks.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::variable::Values;

/// Subtask id meaning "no subtask grouping": the whole problem.
pub const MAIN_ID: i32 = -1;

/// Points of the implicit main subtask when a problem declares none.
pub const MAIN_POINTS: f64 = 100.0;

/// A partial-score bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: i32,
    pub points: f64,
}

impl Subtask {
    pub fn new(id: i32, points: f64) -> Self {
        Self { id, points }
    }

    /// The implicit subtask of a problem without subtasks.
    pub fn main() -> Self {
        Self::new(MAIN_ID, MAIN_POINTS)
    }
}

/// A named test case and the subtasks it counts toward.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    name: String,
    description: Option<String>,
    subtask_ids: BTreeSet<i32>,
    input: Values,
    output: Option<Values>,
}

impl TestCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn subtask_ids(&self) -> &BTreeSet<i32> {
        &self.subtask_ids
    }

    pub fn input(&self) -> &Values {
        &self.input
    }

    /// Expected output values, when the problem-setter wrote them by hand.
    pub fn output(&self) -> Option<&Values> {
        self.output.as_ref()
    }

    /// `<dir>/<name>.in`
    pub fn input_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.in", self.name))
    }

    /// `<dir>/<name>.out`
    pub fn output_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.out", self.name))
    }
}

/// Builds a [`TestCase`].
#[derive(Debug, Default)]
pub struct TestCaseBuilder {
    name: Option<String>,
    description: Option<String>,
    subtask_ids: BTreeSet<i32>,
    input: Values,
    output: Option<Values>,
}

impl TestCaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_subtask_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.subtask_ids = ids.into_iter().collect();
        self
    }

    pub fn set_input(mut self, values: Values) -> Self {
        self.input = values;
        self
    }

    pub fn set_output(mut self, values: Values) -> Self {
        self.output = Some(values);
        self
    }

    /// Freeze the test case. An empty subtask set means `{MAIN_ID}`.
    pub fn build(self) -> Result<TestCase, ConfigError> {
        let name = self.name.ok_or(ConfigError::MissingTestCaseName)?;
        if !is_valid_name(&name) {
            return Err(ConfigError::InvalidTestCaseName(name));
        }
        let subtask_ids = if self.subtask_ids.is_empty() {
            BTreeSet::from([MAIN_ID])
        } else {
            self.subtask_ids
        };
        Ok(TestCase {
            name,
            description: self.description,
            subtask_ids,
            input: self.input,
            output: self.output,
        })
    }
}

// The name becomes a file stem.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('_')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
