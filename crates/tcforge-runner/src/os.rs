//! Local files, directories and child processes.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use tcforge_core::traits::{
    CapturedOutput, ExecutionRequest, ExecutionResult, OperatingSystem, ReadStream, WriteStream,
};

/// [`OperatingSystem`] backed by the machine tcforge runs on.
///
/// Commands go through the platform shell (`sh -c`, or `cmd /C` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOperatingSystem;

impl LocalOperatingSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperatingSystem for LocalOperatingSystem {
    fn open_for_reading(&self, path: &Path) -> Result<ReadStream> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_for_writing(&self, path: &Path) -> Result<WriteStream> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn force_make_dir(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
                .with_context(|| format!("failed to clear directory {}", path.display()))?;
        } else if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        std::fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))
    }

    fn remove_file(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove {}: {}", path.display(), e),
        }
    }

    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut cmd = shell_command(&request.command);

        let stdin = match &request.input {
            Some(path) => Stdio::from(
                File::open(path)
                    .with_context(|| format!("failed to open input {}", path.display()))?,
            ),
            None => Stdio::null(),
        };
        let stdout = match &request.output {
            Some(path) => Stdio::from(
                File::create(path)
                    .with_context(|| format!("failed to create output {}", path.display()))?,
            ),
            None => Stdio::null(),
        };
        // stderr is read through a pipe; a leftover file from an older run is stale.
        let stderr = match &request.error {
            Some(path) => {
                self.remove_file(path);
                Stdio::piped()
            }
            None => Stdio::null(),
        };
        cmd.stdin(stdin).stdout(stdout).stderr(stderr);

        tracing::debug!(command = %request.command, "executing");
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", request.command))?;
        let finished = child
            .wait_with_output()
            .await
            .with_context(|| format!("failed to wait for `{}`", request.command))?;

        let output = match &request.output {
            Some(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read back {}", path.display()))?,
            None => Vec::new(),
        };
        let error = if request.error.is_some() {
            finished.stderr
        } else {
            Vec::new()
        };

        let (exit_code, exit_status, signal) = decode_status(finished.status);
        tracing::debug!(
            command = %request.command,
            exit_status,
            ?signal,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "finished"
        );

        Ok(ExecutionResult {
            exit_code,
            exit_status,
            signal,
            output: CapturedOutput::new(output),
            error: CapturedOutput::new(error),
        })
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// `(raw wait status, exit status, terminating signal)`.
#[cfg(unix)]
fn decode_status(status: ExitStatus) -> (i32, i32, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;

    let raw = status.into_raw();
    (raw, (raw >> 8) & 0xff, status.signal())
}

/// `(exit code, low byte of the exit code, None)`; -1 when the host reports no code.
#[cfg(not(unix))]
fn decode_status(status: ExitStatus) -> (i32, i32, Option<i32>) {
    let code = status.code().unwrap_or(-1);
    (code, code & 0xff, None)
}

/// Quote one argument for the platform shell.
#[cfg(not(windows))]
pub fn quote_arg(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':'))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Quote one argument for the platform shell.
#[cfg(windows)]
pub fn quote_arg(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\"\""))
}
