//! Core trait definitions for the host operating system and for scorers.
//!
//! `OperatingSystem` is implemented by `tcforge-runner`; scorers live in this
//! crate (in-process) and in the runner (external checkers).

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::results::ScoringResult;

// ---------------------------------------------------------------------------
// Operating system
// ---------------------------------------------------------------------------

/// A readable file handle, closed on drop.
pub type ReadStream = Box<dyn Read + Send>;

/// A writable file handle, closed on drop.
pub type WriteStream = Box<dyn Write + Send>;

/// Files, directories, and child processes.
#[async_trait]
pub trait OperatingSystem: Send + Sync {
    /// Open a file for reading.
    fn open_for_reading(&self, path: &Path) -> anyhow::Result<ReadStream>;

    /// Create (or truncate) a file for writing.
    fn open_for_writing(&self, path: &Path) -> anyhow::Result<WriteStream>;

    /// Flush and release a stream returned by `open_for_writing`.
    ///
    /// Dropping the stream also releases it, but silently loses flush errors.
    fn close_opened_writing_stream(&self, mut stream: WriteStream) -> anyhow::Result<()> {
        stream.flush().context("failed to flush written file")
    }

    /// Reset a directory to empty, creating it if needed.
    fn force_make_dir(&self, path: &Path) -> anyhow::Result<()>;

    /// Delete a file. Absent files are ignored.
    fn remove_file(&self, path: &Path);

    /// Run a command to completion with redirected standard streams.
    ///
    /// A non-zero exit is reported in the result, not as an error. Errors
    /// mean the command could not be run at all.
    async fn execute(&self, request: &ExecutionRequest) -> anyhow::Result<ExecutionResult>;
}

/// What to run and where its standard streams go.
///
/// A `None` input means an empty stdin; a `None` output or error means the
/// stream is discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Shell command line.
    pub command: String,
    /// File bound to stdin.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// File receiving stdout; kept after execution.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Capture channel for stderr; never left on disk.
    #[serde(default)]
    pub error: Option<PathBuf>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn error(mut self, path: impl Into<PathBuf>) -> Self {
        self.error = Some(path.into());
        self
    }
}

/// Bytes captured from a child's standard stream, readable like a file.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Cursor<Vec<u8>>);

impl CapturedOutput {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Cursor::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.get_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.get_ref().is_empty()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.0.get_ref()).into_owned()
    }
}

impl Read for CapturedOutput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

/// Exit information and captured streams of a finished child.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Raw status as reported by the host (the wait status on POSIX).
    pub exit_code: i32,
    /// Decoded exit status (`WEXITSTATUS` on POSIX).
    pub exit_status: i32,
    /// Signal that terminated the child, if any.
    pub signal: Option<i32>,
    /// Standard output, read back from the output file.
    pub output: CapturedOutput,
    /// Standard error.
    pub error: CapturedOutput,
}

impl ExecutionResult {
    /// True if the child exited normally with status 0.
    pub fn is_success(&self) -> bool {
        self.signal.is_none() && self.exit_status == 0
    }

    /// "exit status N" or "killed by signal N".
    pub fn describe_exit(&self) -> String {
        match self.signal {
            Some(signal) => format!("killed by signal {signal}"),
            None => format!("exit status {}", self.exit_status),
        }
    }

    /// [`describe_exit`](Self::describe_exit) followed by the captured stderr.
    pub fn failure_message(&self) -> String {
        let mut message = self.describe_exit();
        let stderr = self.error.to_string_lossy();
        let stderr = stderr.trim_end();
        if !stderr.trim_start().is_empty() {
            message.push('\n');
            message.push_str(stderr);
        }
        message
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Conventional file a scorer writes detail output to when it runs an
/// external checker.
pub const SCORING_OUT_FILENAME: &str = "_scoring.out";

/// Turns (input, candidate output, reference output) into a verdict.
///
/// Implementations must not modify any of the three files. Wrong answers are
/// `Ok` results; `Err` is reserved for infrastructural failures.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short name for logs and reports (e.g. "diff").
    fn name(&self) -> &str;

    async fn score(
        &self,
        input: &Path,
        output: &Path,
        evaluation: &Path,
    ) -> Result<ScoringResult, ScoringError>;
}
