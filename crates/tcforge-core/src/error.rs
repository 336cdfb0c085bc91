//! Error types.
//!
//! `ConfigError` covers authoring mistakes in a problem definition: malformed
//! formats, values that do not fit the declared shapes, bad test case names.
//! They are fatal for a run. `ScoringError` covers infrastructural failures
//! while scoring; wrong answers are never errors, they are `ScoringResult`s.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::{Direction, IOSegmentKind};

/// A problem-setter configuration error, surfaced at build or print time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `build()` was called before choosing input or output.
    #[error("format direction was never selected")]
    MissingDirection,

    /// Input/output was selected more than once on the same builder.
    #[error("format direction selected more than once")]
    DirectionAlreadySet,

    /// A format must contain at least one segment.
    #[error("{0} format has no segments")]
    EmptyFormat(Direction),

    /// A format or segment was handed to a consumer expecting the other direction.
    #[error("expected an {expected} format, got an {actual} format")]
    WrongDirection {
        expected: Direction,
        actual: Direction,
    },

    /// Two variables in the same format share a name.
    #[error("variable '{0}' is declared more than once")]
    DuplicateVariable(String),

    /// The declared variables cannot be laid out by this segment kind.
    #[error("invalid {kind} segment: {reason}")]
    InvalidSegment { kind: IOSegmentKind, reason: String },

    /// No value was bound for a declared variable.
    #[error("no value bound for variable '{0}'")]
    MissingValue(String),

    /// The bound value does not have the declared shape.
    #[error("variable '{name}' must be a {expected}")]
    ValueShape { name: String, expected: &'static str },

    /// A vector or matrix does not match its declared size.
    #[error("variable '{name}' has {actual} elements, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A size expression does not resolve to a non-negative integer.
    #[error("size '{0}' does not resolve to a non-negative integer")]
    InvalidSize(String),

    /// No printer is registered for a segment kind.
    #[error("no printer registered for {0} segments")]
    NoPrinter(IOSegmentKind),

    /// Output values were printed but the problem declares no output format.
    #[error("no output format declared")]
    NoOutputFormat,

    /// A test case was built without a name.
    #[error("test case has no name")]
    MissingTestCaseName,

    /// A test case name that cannot be used as a file stem.
    #[error("invalid test case name '{0}'")]
    InvalidTestCaseName(String),

    /// Two test cases share a name.
    #[error("test case '{0}' is declared more than once")]
    DuplicateTestCase(String),

    /// Two subtasks share an id.
    #[error("subtask {0} is declared more than once")]
    DuplicateSubtask(i32),

    /// A test case refers to a subtask that does not exist.
    #[error("test case '{test_case}' refers to unknown subtask {subtask}")]
    UnknownSubtask { test_case: String, subtask: i32 },

    /// Writing to the output stream failed.
    #[error("I/O error while printing: {0}")]
    Io(#[from] std::io::Error),
}

/// An infrastructural failure while scoring, as opposed to a grading outcome.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// One of the files handed to the scorer does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external checker could not be started.
    #[error("failed to launch checker `{command}`: {message}")]
    CheckerLaunch { command: String, message: String },
}
