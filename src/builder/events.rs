//! Build event types for JSON output.
//!
//! This module defines the stable JSON schema for machine-readable build output.
//! These events are emitted when using `--message-format=json`, one JSON
//! object per line on stdout.
//!
//! # Event Types
//!
//! - `build-started`: A module build began
//! - `compiler-output`: A line of combined compiler output
//! - `diagnostic`: A message from nativemod itself (spawn failure, fallback)
//! - `build-finished`: Build completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::report::{Attempt, BuildReport};
use crate::core::ModuleLanguage;

/// A build event emitted during the build process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A module build began.
    #[serde(rename = "build-started")]
    BuildStarted {
        module: String,
        language: ModuleLanguage,
        /// Operating system identifier the toolchain was chosen for
        os: String,
    },

    /// A line of compiler output.
    #[serde(rename = "compiler-output")]
    CompilerOutput { module: String, line: String },

    /// A message from the builder.
    #[serde(rename = "diagnostic")]
    Diagnostic {
        /// Severity level ("error", "warning", "note")
        level: String,
        message: String,
    },

    /// Build completed (success or failure).
    #[serde(rename = "build-finished")]
    BuildFinished {
        module: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Expected artifact location
        artifact: PathBuf,
        /// Whether the artifact exists after the build
        produced: bool,
        attempts: Vec<Attempt>,
        duration_ms: u64,
    },
}

impl BuildEvent {
    /// Create a build started event.
    pub fn started(module: impl Into<String>, language: ModuleLanguage, os: impl Into<String>) -> Self {
        BuildEvent::BuildStarted {
            module: module.into(),
            language,
            os: os.into(),
        }
    }

    /// Create a compiler output event.
    pub fn output(module: impl Into<String>, line: impl Into<String>) -> Self {
        BuildEvent::CompilerOutput {
            module: module.into(),
            line: line.into(),
        }
    }

    /// Create a diagnostic event.
    pub fn diagnostic(level: impl Into<String>, message: impl Into<String>) -> Self {
        BuildEvent::Diagnostic {
            level: level.into(),
            message: message.into(),
        }
    }

    /// Create a build finished event from a report.
    pub fn finished(report: &BuildReport, duration_ms: u64) -> Self {
        BuildEvent::BuildFinished {
            module: report.module_name.clone(),
            success: report.succeeded(),
            exit_code: report.exit_code(),
            artifact: report.artifact_path.clone(),
            produced: report.produced_artifact.is_some(),
            attempts: report.attempts.clone(),
            duration_ms,
        }
    }

    /// Serialize this event to a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
