//! In-process output comparison.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::results::ScoringResult;
use crate::traits::Scorer;

/// Longest excerpt of a line quoted in a diagnostic.
const MAX_EXCERPT: usize = 64;

/// How strictly [`DiffScorer`] compares outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Byte-identical.
    Exact,
    /// Same whitespace-separated tokens on every line; trailing blank lines
    /// are ignored.
    #[default]
    IgnoreWhitespace,
}

/// Compares the candidate output against the reference output.
#[derive(Debug, Clone, Default)]
pub struct DiffScorer {
    mode: DiffMode,
}

impl DiffScorer {
    pub fn new(mode: DiffMode) -> Self {
        Self { mode }
    }

    /// Compare two outputs already in memory.
    pub fn compare(&self, candidate: &[u8], reference: &[u8]) -> ScoringResult {
        let candidate = String::from_utf8_lossy(candidate);
        let reference = String::from_utf8_lossy(reference);
        let mismatch = match self.mode {
            DiffMode::Exact => {
                if candidate == reference {
                    return ScoringResult::accepted();
                }
                first_mismatch(
                    candidate.split('\n').map(str::to_string).collect(),
                    reference.split('\n').map(str::to_string).collect(),
                )
            }
            DiffMode::IgnoreWhitespace => {
                first_mismatch(normalized_lines(&candidate), normalized_lines(&reference))
            }
        };
        match mismatch {
            Some(message) => ScoringResult::wrong_answer(message),
            None => ScoringResult::accepted(),
        }
    }
}

#[async_trait]
impl Scorer for DiffScorer {
    fn name(&self) -> &str {
        "diff"
    }

    async fn score(
        &self,
        _input: &Path,
        output: &Path,
        evaluation: &Path,
    ) -> Result<ScoringResult, ScoringError> {
        let reference = read(evaluation).await?;
        let candidate = read(output).await?;
        let result = self.compare(&candidate, &reference);
        tracing::debug!(
            output = %output.display(),
            verdict = %result.verdict,
            "diff scored"
        );
        Ok(result)
    }
}

async fn read(path: &Path) -> Result<Vec<u8>, ScoringError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScoringError::MissingFile(path.to_path_buf())
        } else {
            ScoringError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

// Each line collapsed to single-space-joined tokens, trailing blank lines dropped.
fn normalized_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn first_mismatch(candidate: Vec<String>, reference: Vec<String>) -> Option<String> {
    let len = candidate.len().max(reference.len());
    (0..len).find_map(|i| {
        let got = candidate.get(i);
        let expected = reference.get(i);
        if got == expected {
            return None;
        }
        Some(format!(
            "line {}: expected {}, got {}",
            i + 1,
            describe(expected),
            describe(got)
        ))
    })
}

fn describe(line: Option<&String>) -> String {
    match line {
        None => "end of file".to_string(),
        Some(line) if line.chars().count() > MAX_EXCERPT => {
            let head: String = line.chars().take(MAX_EXCERPT).collect();
            format!("`{head}...`")
        }
        Some(line) => format!("`{line}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Verdict;

    #[test]
    fn exact_identical_is_accepted() {
        let scorer = DiffScorer::new(DiffMode::Exact);
        assert!(scorer.compare(b"1 2\n3\n", b"1 2\n3\n").is_accepted());
    }

    #[test]
    fn exact_names_first_differing_line() {
        let scorer = DiffScorer::new(DiffMode::Exact);
        let result = scorer.compare(b"1 2\n4\n", b"1 2\n3\n");
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert_eq!(result.message.as_deref(), Some("line 2: expected `3`, got `4`"));
    }

    #[test]
    fn exact_is_whitespace_sensitive() {
        let scorer = DiffScorer::new(DiffMode::Exact);
        let result = scorer.compare(b"1  2\n", b"1 2\n");
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        let result = scorer.compare(b"1 2", b"1 2\n");
        assert_eq!(
            result.message.as_deref(),
            Some("line 2: expected ``, got end of file")
        );
    }

    #[test]
    fn ignore_whitespace_accepts_spacing_differences() {
        let scorer = DiffScorer::new(DiffMode::IgnoreWhitespace);
        assert!(scorer.compare(b"1   2 \r\n3\n\n\n", b"1 2\n3\n").is_accepted());
        assert!(scorer.compare(b"1 2\n3", b"1 2\n3\n").is_accepted());
    }

    #[test]
    fn ignore_whitespace_keeps_line_structure() {
        let scorer = DiffScorer::new(DiffMode::IgnoreWhitespace);
        let result = scorer.compare(b"1\n2\n", b"1 2\n");
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert!(result.message.unwrap().starts_with("line 1:"));
    }

    #[test]
    fn missing_output_line_reported() {
        let scorer = DiffScorer::default();
        let result = scorer.compare(b"1\n", b"1\n2\n");
        assert_eq!(
            result.message.as_deref(),
            Some("line 2: expected `2`, got end of file")
        );
    }

    #[test]
    fn long_lines_are_truncated() {
        let scorer = DiffScorer::default();
        let long = "x".repeat(200);
        let result = scorer.compare(long.as_bytes(), b"y");
        let message = result.message.unwrap();
        assert!(message.len() < 120, "{message}");
        assert!(message.contains("..."));
    }

    #[tokio::test]
    async fn score_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.in");
        let output = dir.path().join("a.cand");
        let evaluation = dir.path().join("a.out");
        std::fs::write(&input, "1\n").unwrap();
        std::fs::write(&output, "2\n").unwrap();
        std::fs::write(&evaluation, "2\n").unwrap();

        let result = DiffScorer::default()
            .score(&input, &output, &evaluation)
            .await
            .unwrap();
        assert!(result.is_accepted());
        // Scoring leaves the files alone.
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "2\n");
    }

    #[tokio::test]
    async fn missing_file_is_infrastructural() {
        let dir = tempfile::tempdir().unwrap();
        let evaluation = dir.path().join("a.out");
        std::fs::write(&evaluation, "2\n").unwrap();
        let missing = dir.path().join("nope");

        let err = DiffScorer::default()
            .score(&evaluation, &missing, &evaluation)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::MissingFile(ref p) if p == &missing));
    }
}
