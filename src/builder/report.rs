//! Structured build results.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::builder::toolchain::ToolchainKind;
use crate::core::ModuleLanguage;

/// How one toolchain attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AttemptOutcome {
    /// The process ran to completion.
    Exited {
        /// Exit code, `None` if killed by a signal
        exit_code: Option<i32>,
        /// Combined stdout and stderr
        output: String,
    },
    /// The program could not be launched.
    SpawnFailed { message: String },
    /// Reading the output or waiting for the program failed.
    Interrupted { message: String },
    /// The program was killed after running too long.
    TimedOut {
        #[serde(rename = "after_ms", serialize_with = "serialize_millis")]
        after: Duration,
    },
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// One toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub toolchain: ToolchainKind,
    /// Command line as displayed to the user
    pub command: String,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn succeeded(&self) -> bool {
        matches!(
            self.outcome,
            AttemptOutcome::Exited {
                exit_code: Some(0),
                ..
            }
        )
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            AttemptOutcome::Exited { exit_code, .. } => exit_code,
            _ => None,
        }
    }

    pub fn output(&self) -> &str {
        match &self.outcome {
            AttemptOutcome::Exited { output, .. } => output,
            _ => "",
        }
    }
}

/// Result of building one module.
///
/// `artifact_path` is where the artifact is expected, whether or not the
/// build worked. Check [`succeeded`](Self::succeeded) or
/// [`produced_artifact`](Self::produced_artifact) before loading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub language: ModuleLanguage,
    pub module_name: String,
    /// Expected artifact location
    pub artifact_path: PathBuf,
    /// Artifact found on disk after the build
    pub produced_artifact: Option<PathBuf>,
    /// Toolchain invocations in the order they ran
    pub attempts: Vec<Attempt>,
}

impl BuildReport {
    pub fn new(language: ModuleLanguage, module_name: impl Into<String>, artifact_path: PathBuf) -> Self {
        BuildReport {
            language,
            module_name: module_name.into(),
            artifact_path,
            produced_artifact: None,
            attempts: Vec::new(),
        }
    }

    /// The attempt whose result stands.
    pub fn final_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    /// Whether the final attempt exited with status 0.
    pub fn succeeded(&self) -> bool {
        self.final_attempt().is_some_and(Attempt::succeeded)
    }

    /// Exit code of the final attempt.
    pub fn exit_code(&self) -> Option<i32> {
        self.final_attempt().and_then(Attempt::exit_code)
    }

    /// Combined output of the final attempt.
    pub fn captured_output(&self) -> &str {
        self.final_attempt().map(Attempt::output).unwrap_or("")
    }

    /// Whether any attempt could not be launched at all.
    pub fn spawn_failed(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(a.outcome, AttemptOutcome::SpawnFailed { .. }))
    }

    /// Toolchains that ran, in order.
    pub fn toolchains(&self) -> Vec<ToolchainKind> {
        self.attempts.iter().map(|a| a.toolchain).collect()
    }
}
