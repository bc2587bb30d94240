//! Test utilities and mocks for nativemod unit tests.
//!
//! [`MockRunner`] stands in for [`SystemRunner`](crate::util::process::SystemRunner)
//! so builder tests can script compiler results without a toolchain, and
//! [`RecordingSink`] captures everything the builder reports.
//!
//! # Example
//!
//! ```rust,ignore
//! use nativemod::test_support::{MockResponse, MockRunner, RecordingSink};
//!
//! let runner = MockRunner::new()
//!     .expect_prefix("gcc", MockResponse::failure(1, "m.c:3: error: expected ';'"))
//!     .expect_prefix("cmd", MockResponse::success("").creating("m.dll"));
//! ```

pub mod fixtures;

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::builder::toolchain::CommandSpec;
use crate::util::process::{OutputSink, ProcessResult, ProcessRunner, RunError};

pub use fixtures::*;

/// Sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
    notes: Mutex<Vec<String>>,
    diagnostics: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().unwrap().clone()
    }
}

impl OutputSink for RecordingSink {
    fn line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn note(&self, message: &str) {
        self.notes.lock().unwrap().push(message.to_string());
    }

    fn diagnostic(&self, message: &str) {
        self.diagnostics.lock().unwrap().push(message.to_string());
    }
}

/// Scripted result of a mocked process.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process ran and exited with `code`.
    Exit {
        code: i32,
        /// Combined output, forwarded line by line
        output: String,
        /// Files to create, relative to the command's working directory
        creates: Vec<PathBuf>,
    },
    /// The program could not be launched.
    SpawnFailure,
    /// The process ran past its deadline.
    Timeout(Duration),
}

impl MockResponse {
    /// Exit status 0 with the given output.
    pub fn success(output: impl Into<String>) -> Self {
        MockResponse::Exit {
            code: 0,
            output: output.into(),
            creates: Vec::new(),
        }
    }

    /// Non-zero exit with the given output.
    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        MockResponse::Exit {
            code,
            output: output.into(),
            creates: Vec::new(),
        }
    }

    /// Also create `path` when the response is applied.
    pub fn creating(mut self, path: impl Into<PathBuf>) -> Self {
        if let MockResponse::Exit { ref mut creates, .. } = self {
            creates.push(path.into());
        }
        self
    }
}

/// Pattern for matching displayed command lines.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on the full command line.
    Exact(String),
    /// Match if the command line starts with a prefix.
    StartsWith(String),
    /// Match if the command line contains a substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    pub pattern: CommandPattern,
    pub response: MockResponse,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, response: MockResponse) -> Self {
        CommandExpectation {
            pattern,
            response,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// One recorded call to [`MockRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInvocation {
    /// Displayed command line
    pub command: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Whether each watched path existed when the command started
    pub watched: Vec<(PathBuf, bool)>,
}

/// Mock process runner.
///
/// Commands are matched against expectations in the order they were added;
/// the first available match wins. Unmatched commands fall back to the
/// default response, or fail to spawn.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Mutex<Vec<CommandExpectation>>,
    invocations: Mutex<Vec<MockInvocation>>,
    default_response: Option<MockResponse>,
    watched: Vec<PathBuf>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Expect an exact command line.
    pub fn expect(self, cmd: &str, response: MockResponse) -> Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            response,
        ))
    }

    /// Expect a command line starting with `prefix`.
    pub fn expect_prefix(self, prefix: &str, response: MockResponse) -> Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            response,
        ))
    }

    /// Expect a command line containing `substring`.
    pub fn expect_contains(self, substring: &str, response: MockResponse) -> Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            response,
        ))
    }

    pub fn expect_pattern(self, expectation: CommandExpectation) -> Self {
        self.expectations.lock().unwrap().push(expectation);
        self
    }

    /// Response for commands that match no expectation.
    pub fn with_default(mut self, response: MockResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Record whether `path` exists each time a command starts.
    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.watched.push(path.into());
        self
    }

    pub fn invocations(&self) -> Vec<MockInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Displayed command lines, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .map(|i| i.command)
            .collect()
    }

    /// Verify that all expectations with a count were used exactly that often.
    pub fn verify(&self) -> Result<(), String> {
        for (i, exp) in self.expectations.lock().unwrap().iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    return Err(format!(
                        "expectation {} was used {} times, expected {}",
                        i, exp.used, expected
                    ));
                }
            }
        }
        Ok(())
    }

    fn respond_to(&self, command: &str) -> Option<MockResponse> {
        let mut expectations = self.expectations.lock().unwrap();
        for exp in expectations.iter_mut() {
            if exp.pattern.matches(command) && exp.available() {
                exp.used += 1;
                return Some(exp.response.clone());
            }
        }
        self.default_response.clone()
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec, sink: &dyn OutputSink) -> Result<ProcessResult, RunError> {
        let command = spec.display();
        let watched = self
            .watched
            .iter()
            .map(|p| (p.clone(), p.exists()))
            .collect();

        self.invocations.lock().unwrap().push(MockInvocation {
            command: command.clone(),
            program: spec.program.clone(),
            args: spec.args.clone(),
            cwd: spec.cwd.clone(),
            watched,
        });

        let Some(response) = self.respond_to(&command) else {
            return Err(RunError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::other(format!("unexpected command: {}", command)),
            });
        };

        match response {
            MockResponse::Exit {
                code,
                output,
                creates,
            } => {
                for path in creates {
                    let path = match spec.cwd {
                        Some(ref cwd) if path.is_relative() => cwd.join(path),
                        _ => path,
                    };
                    std::fs::write(&path, b"mock artifact").unwrap();
                }

                let mut combined = String::new();
                for line in output.lines() {
                    if !line.is_empty() {
                        sink.line(line);
                    }
                    combined.push_str(line);
                    combined.push('\n');
                }

                Ok(ProcessResult {
                    exit_code: Some(code),
                    output: combined,
                })
            }
            MockResponse::SpawnFailure => Err(RunError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
            MockResponse::Timeout(after) => Err(RunError::TimedOut {
                program: spec.program.clone(),
                after,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::process::NullSink;

    #[tokio::test]
    async fn test_mock_runner_matches_in_order() {
        let runner = MockRunner::new()
            .expect_pattern(
                CommandExpectation::new(
                    CommandPattern::StartsWith("gcc".to_string()),
                    MockResponse::failure(1, "boom"),
                )
                .times(1),
            )
            .expect_prefix("gcc", MockResponse::success("ok"));

        let spec = CommandSpec::new("gcc").arg("m.c");
        let first = runner.run(&spec, &NullSink).await.unwrap();
        let second = runner.run(&spec, &NullSink).await.unwrap();

        assert_eq!(first.exit_code, Some(1));
        assert_eq!(second.exit_code, Some(0));
        assert_eq!(runner.commands(), vec!["gcc m.c", "gcc m.c"]);
        assert!(runner.verify().is_ok());
    }

    #[tokio::test]
    async fn test_mock_runner_unexpected_command_fails_to_spawn() {
        let runner = MockRunner::new();
        let err = runner
            .run(&CommandSpec::new("f2py"), &NullSink)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Spawn { .. }));
        assert!(err.to_string().contains("unexpected command"));
    }

    #[tokio::test]
    async fn test_mock_runner_forwards_non_empty_lines() {
        let sink = RecordingSink::new();
        let runner = MockRunner::new().with_default(MockResponse::success("a\n\nb"));

        let result = runner.run(&CommandSpec::new("x"), &sink).await.unwrap();

        assert_eq!(result.output, "a\n\nb\n");
        assert_eq!(sink.lines(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_runner_creates_files_in_cwd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let runner = MockRunner::new()
            .with_default(MockResponse::success("").creating("out.so"))
            .watch(tmp.path().join("out.so"));

        let spec = CommandSpec::new("cc").cwd(tmp.path());
        runner.run(&spec, &NullSink).await.unwrap();
        runner.run(&spec, &NullSink).await.unwrap();

        assert!(tmp.path().join("out.so").exists());
        let invocations = runner.invocations();
        assert!(!invocations[0].watched[0].1);
        assert!(invocations[1].watched[0].1);
    }
}
