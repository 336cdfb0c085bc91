//! External checker scorer.
//!
//! The checker is invoked as `<command> <input> <evaluation> <output>` and
//! reports on stdout:
//!
//! ```text
//! AC | WA | OK
//! [score, only after OK: a fraction like 0.4 or a percentage like 40%]
//! [message lines...]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use tcforge_core::error::ScoringError;
use tcforge_core::results::ScoringResult;
use tcforge_core::traits::{ExecutionRequest, OperatingSystem, Scorer, SCORING_OUT_FILENAME};

use crate::os::quote_arg;

/// Capture channel for the checker's stderr.
const SCORING_ERROR_FILENAME: &str = "_scoring.err";

/// Scores by running a problem-specific checker program.
pub struct CustomScorer {
    os: Arc<dyn OperatingSystem>,
    command: String,
    work_dir: PathBuf,
}

impl CustomScorer {
    /// `work_dir` receives the checker's stdout as [`SCORING_OUT_FILENAME`].
    pub fn new(
        os: Arc<dyn OperatingSystem>,
        command: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            os,
            command: command.into(),
            work_dir: work_dir.into(),
        }
    }
}

#[async_trait]
impl Scorer for CustomScorer {
    fn name(&self) -> &str {
        "custom"
    }

    async fn score(
        &self,
        input: &Path,
        output: &Path,
        evaluation: &Path,
    ) -> Result<ScoringResult, ScoringError> {
        for path in [input, output, evaluation] {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(ScoringError::MissingFile(path.to_path_buf()));
            }
        }

        let command = format!(
            "{} {} {} {}",
            self.command,
            quote_arg(&input.to_string_lossy()),
            quote_arg(&evaluation.to_string_lossy()),
            quote_arg(&output.to_string_lossy()),
        );
        let request = ExecutionRequest::new(command.clone())
            .output(self.work_dir.join(SCORING_OUT_FILENAME))
            .error(self.work_dir.join(SCORING_ERROR_FILENAME));

        let result = self
            .os
            .execute(&request)
            .await
            .map_err(|e| ScoringError::CheckerLaunch {
                command,
                message: format!("{e:#}"),
            })?;

        if !result.is_success() {
            return Ok(ScoringResult::error(format!(
                "checker failed with {}",
                result.failure_message()
            )));
        }

        Ok(parse_checker_output(
            &result.output.to_string_lossy(),
            &result.error.to_string_lossy(),
        ))
    }
}

/// Interpret a checker's stdout; `stderr` is appended to the message.
pub fn parse_checker_output(stdout: &str, stderr: &str) -> ScoringResult {
    let mut lines = stdout.lines();
    let verdict = lines.next().unwrap_or("").trim();

    let result = match verdict {
        "AC" => ScoringResult::accepted(),
        "WA" => ScoringResult::wrong_answer(""),
        "OK" => {
            let raw = lines.next().unwrap_or("").trim();
            match parse_score(raw) {
                Some(score) => ScoringResult::from_score(score),
                None => {
                    return ScoringResult::error(format!(
                        "checker reported an invalid score `{raw}`"
                    ));
                }
            }
        }
        "" => return ScoringResult::error("checker printed no verdict"),
        other => return ScoringResult::error(format!("unknown checker verdict `{other}`")),
    };

    let mut message = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    append_detail(&mut message, stderr);
    result.with_message(message)
}

fn parse_score(raw: &str) -> Option<f64> {
    let score = match raw.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    (score.is_finite() && (0.0..=1.0).contains(&score)).then_some(score)
}

fn append_detail(message: &mut String, detail: &str) {
    let detail = detail.trim();
    if detail.is_empty() {
        return;
    }
    if !message.is_empty() {
        message.push('\n');
    }
    message.push_str(detail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcforge_core::results::Verdict;

    #[test]
    fn accepted_with_message() {
        let result = parse_checker_output("AC\nall good\n", "");
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.message.as_deref(), Some("all good"));
    }

    #[test]
    fn wrong_answer_appends_stderr() {
        let result = parse_checker_output("WA\nexpected 6\n", "found 5\n");
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert_eq!(result.message.as_deref(), Some("expected 6\nfound 5"));
    }

    #[test]
    fn partial_scores() {
        let result = parse_checker_output("OK\n0.4\n", "");
        assert_eq!(result.verdict, Verdict::PartiallyAccepted);
        assert_eq!(result.score, Some(0.4));

        let result = parse_checker_output("OK\n40%\nclose\n", "");
        assert_eq!(result.verdict, Verdict::PartiallyAccepted);
        assert!((result.fraction() - 0.4).abs() < 1e-9);
        assert_eq!(result.message.as_deref(), Some("close"));

        assert_eq!(parse_checker_output("OK\n100%\n", "").verdict, Verdict::Accepted);
        assert_eq!(parse_checker_output("OK\n0\n", "").verdict, Verdict::WrongAnswer);
    }

    #[test]
    fn malformed_output_is_an_error_verdict() {
        assert_eq!(parse_checker_output("", "").verdict, Verdict::Error);
        assert_eq!(parse_checker_output("maybe\n", "").verdict, Verdict::Error);
        assert_eq!(parse_checker_output("OK\n", "").verdict, Verdict::Error);
        assert_eq!(parse_checker_output("OK\n1.5\n", "").verdict, Verdict::Error);
        assert_eq!(parse_checker_output("OK\nlots\n", "").verdict, Verdict::Error);
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::os::LocalOperatingSystem;

        fn write_checker(dir: &Path, body: &str) -> String {
            let path = dir.join("checker.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            format!("sh {}", path.display())
        }

        fn files(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
            let input = dir.join("a.in");
            let output = dir.join("a.cand");
            let evaluation = dir.join("a.out");
            std::fs::write(&input, "1 2\n").unwrap();
            std::fs::write(&output, "3\n").unwrap();
            std::fs::write(&evaluation, "3\n").unwrap();
            (input, output, evaluation)
        }

        #[tokio::test]
        async fn checker_receives_input_evaluation_output() {
            let dir = tempfile::tempdir().unwrap();
            let (input, output, evaluation) = files(dir.path());
            // Accept only when argument 2 is the reference and 3 the candidate.
            let command = write_checker(
                dir.path(),
                r#"case "$2" in *.out) ;; *) echo WA; exit 0 ;; esac
case "$3" in *.cand) echo AC ;; *) echo WA ;; esac"#,
            );
            let scorer = CustomScorer::new(Arc::new(LocalOperatingSystem), command, dir.path());

            let result = scorer.score(&input, &output, &evaluation).await.unwrap();
            assert!(result.is_accepted(), "{result:?}");
            assert!(dir.path().join(SCORING_OUT_FILENAME).exists());
            assert!(!dir.path().join(SCORING_ERROR_FILENAME).exists());
        }

        #[tokio::test]
        async fn checker_failure_is_error_verdict() {
            let dir = tempfile::tempdir().unwrap();
            let (input, output, evaluation) = files(dir.path());
            let command = write_checker(dir.path(), "echo broken >&2; exit 2");
            let scorer = CustomScorer::new(Arc::new(LocalOperatingSystem), command, dir.path());

            let result = scorer.score(&input, &output, &evaluation).await.unwrap();
            assert_eq!(result.verdict, Verdict::Error);
            let message = result.message.unwrap();
            assert!(message.contains("exit status 2"));
            assert!(message.contains("broken"));
        }

        #[tokio::test]
        async fn missing_candidate_is_infrastructural() {
            let dir = tempfile::tempdir().unwrap();
            let (input, _, evaluation) = files(dir.path());
            let missing = dir.path().join("nothing.cand");
            let scorer = CustomScorer::new(Arc::new(LocalOperatingSystem), "true", dir.path());

            let err = scorer.score(&input, &missing, &evaluation).await.unwrap_err();
            assert!(matches!(err, ScoringError::MissingFile(p) if p == missing));
        }
    }
}
