//! User-friendly diagnostic messages.
//!
//! Every failure shown to the user carries what went wrong, the compiler
//! output or file involved, and a suggested next step.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a build fails.
    pub const BUILD_FAILED: &str =
        "help: Run with `--verbose` to see the full command line and working directory";

    /// Suggestion when a compiler could not be launched.
    pub const TOOL_MISSING: &str = "help: Run `nativemod doctor` to check which tools are missing";

    /// Suggestion when f2py is missing.
    pub const NO_F2PY: &str =
        "help: Install numpy in the active Python environment, or set [toolchain] f2py in config.toml";

    /// Suggestion when no Python installation is found.
    pub const NO_PYTHON: &str =
        "help: Activate a virtualenv or conda env, or set [toolchain] python_prefix in config.toml";

    /// Suggestion when the C compiler is missing.
    pub const NO_CC: &str = "help: Install gcc, or set [toolchain] cc in config.toml";

    /// Suggestion when the MSVC tools are missing.
    pub const NO_MSVC: &str = "help: Run from a Developer Command Prompt, or set [toolchain] vcvars and cl";

    /// Suggestion when a configuration file is malformed.
    pub const BAD_CONFIG: &str = "help: Fix the TOML syntax; the file is ignored until it parses";

    /// Generic suggestion for toolchain problems.
    pub const CONFIGURE_TOOLCHAIN: &str = "help: Check the [toolchain] section of config.toml";

    /// Suggestion when a build timed out.
    pub const TIMED_OUT: &str = "help: Raise `--timeout` or [build] timeout_secs in config.toml";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::with_severity(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::with_severity(Severity::Warning, message)
    }

    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  | {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                output.push_str(&format!("{}\n", suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
