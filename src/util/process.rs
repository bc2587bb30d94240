//! Subprocess execution.
//!
//! Compilers are launched through the [`ProcessRunner`] seam so the builder
//! can be driven by a fake runner in tests. [`SystemRunner`] is the real
//! implementation: it spawns the program directly (no shell), reads stdout
//! and stderr concurrently, and merges them line by line in arrival order.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::builder::toolchain::CommandSpec;

/// Receiver for compiler output and builder diagnostics.
pub trait OutputSink: Send + Sync {
    /// A line of combined compiler output, without the line terminator.
    fn line(&self, line: &str);

    /// A progress or success message from the builder.
    fn note(&self, message: &str);

    /// A problem reported by the builder itself (spawn failures, fallbacks).
    fn diagnostic(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&self, _line: &str) {}

    fn note(&self, _message: &str) {}

    fn diagnostic(&self, _message: &str) {}
}

/// Sink that forwards output to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn line(&self, line: &str) {
        tracing::info!(target: "nativemod::compiler", "{}", line);
    }

    fn note(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn diagnostic(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Exit status and combined output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, one line per output line
    pub output: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failure to run a process to completion.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn `{}`: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` did not finish within {}s", program.display(), after.as_secs_f64())]
    TimedOut { program: PathBuf, after: Duration },

    #[error("failed while waiting for `{}`: {source}", program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs a [`CommandSpec`] to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command, forwarding each non-empty output line to `sink`.
    async fn run(&self, spec: &CommandSpec, sink: &dyn OutputSink)
        -> Result<ProcessResult, RunError>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner { timeout: None }
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        sink: &dyn OutputSink,
    ) -> Result<ProcessResult, RunError> {
        let mut cmd = Command::new(&spec.program);
        push_args(&mut cmd, spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(cwd = ?spec.cwd, "spawning `{}`", spec.display());

        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // Both pipes were requested above.
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(RunError::Wait {
                program: spec.program.clone(),
                source: std::io::Error::other("child pipes were not captured"),
            });
        };

        let completion = async {
            let output = merge_output(BufReader::new(stdout), BufReader::new(stderr), sink).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(ProcessResult {
                exit_code: status.code(),
                output,
            })
        };

        let finished = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, completion).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!("failed to kill `{}`: {}", spec.program.display(), e);
                    }
                    return Err(RunError::TimedOut {
                        program: spec.program.clone(),
                        after: limit,
                    });
                }
            },
            None => completion.await,
        };

        finished.map_err(|source| RunError::Wait {
            program: spec.program.clone(),
            source,
        })
    }
}

#[cfg(windows)]
fn push_args(cmd: &mut Command, spec: &CommandSpec) {
    use std::os::windows::process::CommandExt;

    if spec.verbatim {
        for arg in &spec.args {
            cmd.as_std_mut().raw_arg(arg);
        }
    } else {
        cmd.args(&spec.args);
    }
}

#[cfg(not(windows))]
fn push_args(cmd: &mut Command, spec: &CommandSpec) {
    cmd.args(&spec.args);
}

/// Read two line streams until both close, merging them in arrival order.
///
/// Every line is captured; only non-empty lines reach the sink.
async fn merge_output<A, B>(mut stdout: A, mut stderr: B, sink: &dyn OutputSink) -> std::io::Result<String>
where
    A: AsyncBufRead + Unpin,
    B: AsyncBufRead + Unpin,
{
    let mut combined = String::new();
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        // read_until keeps partial reads in the buffer, so losing the race
        // in select! drops no bytes.
        tokio::select! {
            n = stdout.read_until(b'\n', &mut out_buf), if out_open => {
                if n? == 0 {
                    out_open = false;
                } else {
                    emit_line(&mut out_buf, &mut combined, sink);
                }
            }
            n = stderr.read_until(b'\n', &mut err_buf), if err_open => {
                if n? == 0 {
                    err_open = false;
                } else {
                    emit_line(&mut err_buf, &mut combined, sink);
                }
            }
        }
    }

    Ok(combined)
}

fn emit_line(buf: &mut Vec<u8>, combined: &mut String, sink: &dyn OutputSink) {
    let text = String::from_utf8_lossy(buf);
    let line = text.trim_end_matches(['\n', '\r']);
    if !line.is_empty() {
        sink.line(line);
    }
    combined.push_str(line);
    combined.push('\n');
    buf.clear();
}
