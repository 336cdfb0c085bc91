//! Scoring verdicts and results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical outcome of scoring one test case.
///
/// Variants are ordered by severity, so the worst verdict of a group is its
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    PartiallyAccepted,
    WrongAnswer,
    RuntimeError,
    /// The grading machinery itself failed for this test case.
    Error,
}

impl Verdict {
    /// Short code, as printed by judges.
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::PartiallyAccepted => "PA",
            Verdict::WrongAnswer => "WA",
            Verdict::RuntimeError => "RTE",
            Verdict::Error => "ERR",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "Accepted"),
            Verdict::PartiallyAccepted => write!(f, "Partially accepted"),
            Verdict::WrongAnswer => write!(f, "Wrong answer"),
            Verdict::RuntimeError => write!(f, "Runtime error"),
            Verdict::Error => write!(f, "Error"),
        }
    }
}

/// The outcome of scoring one (input, output, evaluation) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub verdict: Verdict,
    /// Human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
    /// Fraction of the test case's value earned, in `[0, 1]`.
    #[serde(default)]
    pub score: Option<f64>,
}

impl ScoringResult {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            message: None,
            score: None,
        }
    }

    pub fn accepted() -> Self {
        Self::new(Verdict::Accepted)
    }

    pub fn wrong_answer(message: impl Into<String>) -> Self {
        Self::new(Verdict::WrongAnswer).with_message(message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(Verdict::RuntimeError).with_message(message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Verdict::Error).with_message(message)
    }

    /// Pick the verdict from a fraction: 0 is wrong, 1 is accepted, anything
    /// in between is partial.
    pub fn from_score(score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        if score <= 0.0 {
            Self::new(Verdict::WrongAnswer)
        } else if (score - 1.0).abs() < 1e-9 {
            Self::accepted()
        } else {
            Self {
                verdict: Verdict::PartiallyAccepted,
                message: None,
                score: Some(score),
            }
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.message = (!message.is_empty()).then_some(message);
        self
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }

    /// Fraction earned: 1 when accepted, the partial score when partially
    /// accepted, 0 otherwise.
    pub fn fraction(&self) -> f64 {
        match self.verdict {
            Verdict::Accepted => 1.0,
            Verdict::PartiallyAccepted => self.score.unwrap_or(0.0).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
