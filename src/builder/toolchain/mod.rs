//! Toolchain abstraction for the Fortran and C build paths.
//!
//! Selection is a pure function of the [`Os`] and the resolved
//! [`ToolchainSettings`]:
//!
//! | OS      | Fortran                               | C                 |
//! |---------|---------------------------------------|-------------------|
//! | Windows | `<prefix>/python.exe -m numpy.f2py`   | gcc, then MSVC    |
//! | Linux   | `<prefix>/bin/f2py`                   | gcc               |
//! | Darwin  | `f2py` from PATH                      | gcc `-fdeclspec`  |
//! | Other   | `f2py` from PATH                      | gcc               |
//!
//! Settings are resolved with this priority:
//! 1. Project config (`<source dir>/.nativemod/config.toml`)
//! 2. Global config (`~/.nativemod/config.toml`)
//! 3. Built-in defaults, with the Python prefix auto-detected

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::error::BuildError;
use crate::core::{BuildRequest, Os};
use crate::util::config::ToolchainSection;

pub mod detect;
mod f2py;
mod gcc;
mod msvc;

pub use detect::{check_tools, detect_python_prefix, ToolCheck};
pub use f2py::{split_flags, F2pyToolchain, DEFAULT_F90FLAGS};
pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

/// A command to execute: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "cmd")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Arguments are already quoted for the target and go to the program as written
    pub verbatim: bool,
    /// Working directory
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            verbatim: false,
            cwd: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Pass the arguments through without any further quoting.
    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Display the command the way a user would type it.
    pub fn display(&self) -> String {
        let program = self.program.to_string_lossy();
        let words = std::iter::once(program.as_ref()).chain(self.args.iter().map(String::as_str));
        if self.verbatim {
            words.collect::<Vec<_>>().join(" ")
        } else {
            shell_words::join(words)
        }
    }
}

/// The family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// f2py driving gfortran (or MinGW on Windows)
    F2py,
    /// GCC building a shared library
    Gcc,
    /// Microsoft Visual C++ via the developer environment script
    Msvc,
}

impl ToolchainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainKind::F2py => "f2py",
            ToolchainKind::Gcc => "gcc",
            ToolchainKind::Msvc => "msvc",
        }
    }
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a selected toolchain: what runs, with which fixed flags,
/// producing which kind of file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainChoice {
    pub kind: ToolchainKind,
    /// Executable path or name
    pub program: PathBuf,
    /// Arguments placed before everything else (e.g. `-m numpy.f2py`)
    pub leading_args: Vec<String>,
    /// Flags the toolchain always passes
    pub fixed_flags: Vec<String>,
    /// Extension of the produced artifact
    pub extension: &'static str,
}

/// Trait for toolchain implementations.
///
/// Each toolchain knows how to turn a [`BuildRequest`] into the single
/// command that builds it.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain family.
    fn kind(&self) -> ToolchainKind;

    /// Describe the toolchain.
    fn choice(&self) -> ToolchainChoice;

    /// Generate the build command for `request`.
    fn compile_command(&self, request: &BuildRequest) -> Result<CommandSpec, BuildError>;
}

/// Resolved toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSettings {
    /// Python installation providing f2py
    pub python_prefix: Option<PathBuf>,
    /// Explicit f2py program, replacing the platform-derived invocation
    pub f2py: Option<PathBuf>,
    /// Default flag string used when a request has no compiler override
    pub fortran_flags: Option<String>,
    /// Flags passed to gfortran through `--f90flags`
    pub f90flags: Vec<String>,
    /// C compiler
    pub cc: PathBuf,
    /// MSVC developer environment script
    pub vcvars: PathBuf,
    /// MSVC compiler
    pub cl: PathBuf,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        ToolchainSettings {
            python_prefix: None,
            f2py: None,
            fortran_flags: None,
            f90flags: DEFAULT_F90FLAGS.iter().map(|s| s.to_string()).collect(),
            cc: PathBuf::from("gcc"),
            vcvars: PathBuf::from("vcvars64.bat"),
            cl: PathBuf::from("cl"),
        }
    }
}

impl ToolchainSettings {
    /// Apply configured values over the defaults.
    pub fn from_config(section: &ToolchainSection) -> Self {
        let defaults = ToolchainSettings::default();
        ToolchainSettings {
            python_prefix: section.python_prefix.clone(),
            f2py: section.f2py.clone(),
            fortran_flags: section.fortran_flags.clone(),
            f90flags: section.f90flags.clone().unwrap_or(defaults.f90flags),
            cc: section.cc.clone().unwrap_or(defaults.cc),
            vcvars: section.vcvars.clone().unwrap_or(defaults.vcvars),
            cl: section.cl.clone().unwrap_or(defaults.cl),
        }
    }

    /// Fill in the Python prefix from the environment if none is configured.
    pub fn with_detected_prefix(mut self, os: Os) -> Self {
        if self.python_prefix.is_none() {
            self.python_prefix = detect_python_prefix(os);
            if let Some(ref prefix) = self.python_prefix {
                tracing::debug!("detected Python prefix: {}", prefix.display());
            }
        }
        self
    }
}

/// Select the Fortran toolchain for `os`.
pub fn fortran_toolchain(os: Os, settings: &ToolchainSettings) -> F2pyToolchain {
    F2pyToolchain::for_os(os, settings)
}

/// Select the C toolchains for `os`: the primary GCC toolchain, plus the
/// MSVC fallback on Windows.
pub fn c_toolchains(os: Os, settings: &ToolchainSettings) -> (GccToolchain, Option<MsvcToolchain>) {
    let gcc = GccToolchain::new(settings.cc.clone(), os);
    let msvc = os
        .is_windows()
        .then(|| MsvcToolchain::new(settings.vcvars.clone(), settings.cl.clone()));
    (gcc, msvc)
}

/// Every toolchain a build on `os` may use, in the order they would run.
pub fn choices_for(os: Os, settings: &ToolchainSettings) -> Vec<ToolchainChoice> {
    let (gcc, msvc) = c_toolchains(os, settings);
    let mut choices = vec![fortran_toolchain(os, settings).choice(), gcc.choice()];
    choices.extend(msvc.map(|tc| tc.choice()));
    choices
}
