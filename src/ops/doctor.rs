//! Environment and toolchain health checks.
//!
//! The `doctor` command verifies that every tool the host toolchains would
//! launch can be found, without compiling anything.
//!
//! ## Usage
//!
//! ```bash
//! nativemod doctor            # Quick check
//! nativemod doctor --verbose  # Paths and hints
//! nativemod doctor --dir gen  # Include gen/.nativemod/config.toml
//! ```
//!
//! ## Checks Performed
//!
//! - Configuration files parse
//! - Python prefix detection (optional)
//! - f2py (or the interpreter running `numpy.f2py` on Windows)
//! - C compiler
//! - On Windows: the MSVC developer environment script and `cl` (optional)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::builder::toolchain::{check_tools, ToolCheck, ToolchainSettings};
use crate::core::Os;
use crate::util::config::{global_config_path, project_config_path, Config};
use crate::util::diagnostic::suggestions;

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool or file (if applicable)
    pub path: Option<PathBuf>,

    /// Hint shown when the check fails
    pub hint: Option<&'static str>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            hint: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            hint: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        DoctorReport::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Source directory whose project config should be included
    pub source_dir: Option<PathBuf>,

    /// Check the toolchains of this OS instead of the host's
    pub os: Option<Os>,
}

/// Run the doctor command.
pub fn doctor(options: DoctorOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();
    let os = options.os.unwrap_or_else(Os::host);
    let source_dir = options.source_dir.unwrap_or_else(|| PathBuf::from("."));

    report.environment.insert("os".to_string(), os.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    let mut config = Config::default();
    if let Some(global) = global_config_path() {
        report.add(check_config_file("Global config", &global, &mut config));
    }
    report.add(check_config_file(
        "Project config",
        &project_config_path(&source_dir),
        &mut config,
    ));

    let settings = ToolchainSettings::from_config(&config.toolchain).with_detected_prefix(os);
    report.add(check_python_prefix(&settings));

    for tool in check_tools(os, &settings) {
        report.add(tool_check_result(tool));
    }

    report.total_duration = start.elapsed();
    Ok(report)
}

/// Parse a config file if it exists and merge it into `config`.
fn check_config_file(name: &str, path: &Path, config: &mut Config) -> CheckResult {
    let start = Instant::now();

    if !path.exists() {
        return CheckResult::pass(name, "not present, using defaults")
            .with_path(path.to_path_buf())
            .with_duration(start.elapsed())
            .optional();
    }

    match Config::load(path) {
        Ok(loaded) => {
            config.merge(loaded);
            CheckResult::pass(name, "parsed")
                .with_path(path.to_path_buf())
                .with_duration(start.elapsed())
        }
        Err(e) => CheckResult::fail(name, format!("{:#}", e))
            .with_path(path.to_path_buf())
            .with_hint(suggestions::BAD_CONFIG)
            .with_duration(start.elapsed()),
    }
}

fn check_python_prefix(settings: &ToolchainSettings) -> CheckResult {
    match &settings.python_prefix {
        Some(prefix) => CheckResult::pass("Python prefix", "detected").with_path(prefix.clone()),
        None => CheckResult::fail("Python prefix", "no Python installation found")
            .with_hint(suggestions::NO_PYTHON)
            .optional(),
    }
}

fn tool_check_result(tool: ToolCheck) -> CheckResult {
    let (name, hint, required) = match tool.role {
        "fortran" => ("Fortran (f2py)", suggestions::NO_F2PY, true),
        "c" => ("C compiler", suggestions::NO_CC, true),
        "msvc environment" => ("MSVC environment", suggestions::NO_MSVC, false),
        "msvc compiler" => ("MSVC compiler", suggestions::NO_MSVC, false),
        other => (other, suggestions::CONFIGURE_TOOLCHAIN, true),
    };

    let result = match tool.resolved {
        Some(path) => CheckResult::pass(name, format!("Found {}", tool.program.display())).with_path(path),
        None => CheckResult::fail(name, format!("`{}` not found", tool.program.display()))
            .with_path(tool.program)
            .with_hint(hint),
    };

    if required {
        result
    } else {
        result.optional()
    }
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "nativemod doctor");
    let _ = writeln!(output, "================\n");

    if verbose {
        let unknown = "unknown".to_string();
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(
            output,
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        );
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
        }
        if !check.passed {
            if let Some(hint) = check.hint {
                let _ = writeln!(output, "      {}", hint);
            }
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. Builds will not work until they are fixed.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed. nativemod is ready to use.");
    }

    output
}
