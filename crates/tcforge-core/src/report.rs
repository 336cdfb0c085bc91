//! Evaluation report types with JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::problem::Problem;
use crate::results::{ScoringResult, Verdict};

/// The result of grading one solution against every test case of a problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Problem slug.
    pub problem: String,
    /// Solution command line.
    pub solution: String,
    /// Per test case results, in evaluation order.
    pub results: Vec<TestCaseOutcome>,
    /// Per subtask scores, in declaration order.
    pub subtasks: Vec<SubtaskSummary>,
    /// Sum of earned subtask points.
    pub total_score: f64,
    /// Sum of all subtask points.
    pub max_score: f64,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// How one test case went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    pub name: String,
    pub subtasks: Vec<i32>,
    pub result: ScoringResult,
    /// The grading machinery failed, not the solution.
    #[serde(default)]
    pub infrastructure: bool,
    pub duration_ms: u64,
}

impl TestCaseOutcome {
    pub fn scored(name: impl Into<String>, subtasks: Vec<i32>, result: ScoringResult) -> Self {
        Self {
            name: name.into(),
            subtasks,
            result,
            infrastructure: false,
            duration_ms: 0,
        }
    }

    /// An outcome for a test case whose grading failed.
    pub fn infrastructure_failure(
        name: impl Into<String>,
        subtasks: Vec<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            infrastructure: true,
            ..Self::scored(name, subtasks, ScoringResult::error(message))
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Score of one subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskSummary {
    pub id: i32,
    pub points: f64,
    pub earned: f64,
    /// Worst verdict among the subtask's test cases.
    pub verdict: Verdict,
    pub test_cases: Vec<String>,
}

impl EvaluationReport {
    /// Aggregate per test case outcomes into subtask scores.
    ///
    /// A subtask earns its points times the smallest fraction earned by any of
    /// its test cases. Test cases without an outcome count as errors.
    pub fn build(
        problem: &Problem,
        solution: impl Into<String>,
        results: Vec<TestCaseOutcome>,
        duration_ms: u64,
    ) -> Self {
        let by_name: BTreeMap<&str, &TestCaseOutcome> =
            results.iter().map(|r| (r.name.as_str(), r)).collect();

        let subtasks: Vec<SubtaskSummary> = problem
            .subtasks()
            .iter()
            .map(|subtask| {
                let names: Vec<String> = problem
                    .test_cases_in(subtask.id)
                    .map(|tc| tc.name().to_string())
                    .collect();
                let (fraction, verdict) = names
                    .iter()
                    .map(|name| match by_name.get(name.as_str()) {
                        Some(outcome) => (outcome.result.fraction(), outcome.result.verdict),
                        None => (0.0, Verdict::Error),
                    })
                    .fold(None, |acc: Option<(f64, Verdict)>, (f, v)| match acc {
                        None => Some((f, v)),
                        Some((af, av)) => Some((af.min(f), av.max(v))),
                    })
                    .unwrap_or((0.0, Verdict::Error));
                SubtaskSummary {
                    id: subtask.id,
                    points: subtask.points,
                    earned: subtask.points * fraction,
                    verdict,
                    test_cases: names,
                }
            })
            .collect();

        let total_score = subtasks.iter().map(|s| s.earned).sum();
        let max_score = problem.max_score();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            problem: problem.slug().to_string(),
            solution: solution.into(),
            results,
            subtasks,
            total_score,
            max_score,
            duration_ms,
        }
    }

    /// True if at least one test case was evaluated and all were accepted.
    pub fn all_accepted(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.result.is_accepted())
    }

    /// Number of test cases per verdict.
    pub fn verdict_counts(&self) -> BTreeMap<Verdict, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.result.verdict).or_insert(0) += 1;
        }
        counts
    }

    /// Test cases whose grading itself failed.
    pub fn infrastructure_failures(&self) -> impl Iterator<Item = &TestCaseOutcome> {
        self.results.iter().filter(|r| r.infrastructure)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
