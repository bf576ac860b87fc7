//! Spawning external tools (bundler, linter, test runner, package manager)

use anyhow::{Context, Result};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Exit status and captured output of a finished process
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Everything the process printed, stdout first
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Human-readable form of a command, for messages
pub fn describe(command: &Command) -> String {
    let std = command.as_std();
    std::iter::once(std.get_program())
        .chain(std.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `command` with piped output, calling `on_line` for every line as it arrives.
///
/// Both pipes are captured in full; a non-zero exit is not an error here.
pub async fn run_streaming<F>(command: &mut Command, mut on_line: F) -> Result<ProcessOutput>
where
    F: FnMut(Stream, &str),
{
    let display = describe(command);
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run `{}`", display))?;

    let stdout = child
        .stdout
        .take()
        .context("Failed to capture stdout")?;
    let stderr = child
        .stderr
        .take()
        .context("Failed to capture stderr")?;

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_line = Vec::new();
    let mut stderr_line = Vec::new();
    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut read_error = None;

    // `read_until` keeps partial reads in the line buffer when the other branch wins
    while !(stdout_done && stderr_done) {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_line), if !stdout_done => {
                match read {
                    Ok(n) => {
                        if !stdout_line.is_empty() {
                            let line = take_line(&mut stdout_line);
                            on_line(Stream::Stdout, &line);
                            stdout_buf.push_str(&line);
                            stdout_buf.push('\n');
                        }
                        stdout_done = n == 0;
                    }
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                }
            }
            read = stderr_reader.read_until(b'\n', &mut stderr_line), if !stderr_done => {
                match read {
                    Ok(n) => {
                        if !stderr_line.is_empty() {
                            let line = take_line(&mut stderr_line);
                            on_line(Stream::Stderr, &line);
                            stderr_buf.push_str(&line);
                            stderr_buf.push('\n');
                        }
                        stderr_done = n == 0;
                    }
                    Err(e) => {
                        read_error = Some(e);
                        break;
                    }
                }
            }
        }
    }

    if read_error.is_some() {
        let _ = child.start_kill();
    }
    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for `{}`", display))?;
    if let Some(e) = read_error {
        return Err(e).with_context(|| format!("Failed to read output of `{}`", display));
    }

    Ok(ProcessOutput {
        status,
        stdout: stdout_buf,
        stderr: stderr_buf,
    })
}

/// Decode one raw line (without its line ending) and reset the buffer.
///
/// Tools may print bytes in a legacy codepage; those are replaced, not rejected.
fn take_line(buf: &mut Vec<u8>) -> String {
    let mut bytes = buf.as_slice();
    if let Some(rest) = bytes.strip_suffix(b"\n") {
        bytes = rest.strip_suffix(b"\r").unwrap_or(rest);
    }
    let line = String::from_utf8_lossy(bytes).into_owned();
    buf.clear();
    line
}

/// Run `command` attached to the terminal
pub async fn run_inherited(command: &mut Command) -> Result<ExitStatus> {
    let display = describe(command);
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to run `{}`", display))
}
