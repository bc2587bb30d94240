//! f2py toolchain implementation.

use std::path::{Path, PathBuf};

use crate::builder::error::BuildError;
use crate::core::{BuildRequest, Os};

use super::{CommandSpec, Toolchain, ToolchainChoice, ToolchainKind, ToolchainSettings};

/// gfortran flags that keep large automatic arrays off the stack in the
/// generated wrapper code (it segfaults otherwise).
pub const DEFAULT_F90FLAGS: &[&str] = &[
    "-ffree-line-length-none",
    "-fno-stack-arrays",
    "-fno-realloc-lhs",
];

/// MinGW is the only backend that reliably builds the wrappers on Windows.
const WINDOWS_DEFAULT_FLAGS: &[&str] = &["--compiler=mingw32", "--skip-empty-wrappers"];

/// f2py driving gfortran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct F2pyToolchain {
    /// Program to launch (f2py itself, or python on Windows)
    pub program: PathBuf,
    /// Arguments selecting f2py when `program` is the interpreter
    pub leading_args: Vec<String>,
    /// Flags used when the request carries no override
    pub default_flags: Vec<String>,
    /// Configured replacement for `default_flags`, still overridable per request
    pub configured_flags: Option<String>,
    /// Flags forwarded to gfortran via `--f90flags`
    pub f90flags: Vec<String>,
}

impl F2pyToolchain {
    /// Select the f2py invocation for `os`.
    pub fn for_os(os: Os, settings: &ToolchainSettings) -> Self {
        let (program, leading_args, default_flags) = match (&settings.f2py, os) {
            (Some(f2py), _) => (f2py.clone(), Vec::new(), platform_flags(os)),
            (None, Os::Windows) => (
                prefixed(settings.python_prefix.as_deref(), &["python.exe"], "python"),
                vec!["-m".to_string(), "numpy.f2py".to_string()],
                platform_flags(os),
            ),
            (None, Os::Linux) => (
                prefixed(settings.python_prefix.as_deref(), &["bin", "f2py"], "f2py"),
                Vec::new(),
                platform_flags(os),
            ),
            // Assume f2py is reachable from PATH.
            (None, Os::Darwin | Os::Other) => (PathBuf::from("f2py"), Vec::new(), platform_flags(os)),
        };

        F2pyToolchain {
            program,
            leading_args,
            default_flags,
            configured_flags: settings.fortran_flags.clone(),
            f90flags: settings.f90flags.clone(),
        }
    }

    /// Flags for a request: its override, else the configured flags, else
    /// the platform defaults.
    fn flags_for(&self, request: &BuildRequest) -> Result<Vec<String>, BuildError> {
        match request
            .compiler_override
            .as_deref()
            .or(self.configured_flags.as_deref())
        {
            Some(flags) => split_flags(flags),
            None => Ok(self.default_flags.clone()),
        }
    }
}

impl Toolchain for F2pyToolchain {
    fn kind(&self) -> ToolchainKind {
        ToolchainKind::F2py
    }

    fn choice(&self) -> ToolchainChoice {
        let mut fixed_flags = self.default_flags.clone();
        if !self.f90flags.is_empty() {
            fixed_flags.push(f90flags_arg(&self.f90flags));
        }

        ToolchainChoice {
            kind: ToolchainKind::F2py,
            program: self.program.clone(),
            leading_args: self.leading_args.clone(),
            fixed_flags,
            extension: "pyd",
        }
    }

    fn compile_command(&self, request: &BuildRequest) -> Result<CommandSpec, BuildError> {
        let flags = self.flags_for(request)?;

        let mut cmd = CommandSpec::new(&self.program)
            .args(self.leading_args.iter().cloned())
            .arg("-c")
            .args(request.fortran_sources())
            .arg("-m")
            .arg(request.fortran_module_name())
            .args(flags);

        // Appended even when the request overrides the other flags.
        if !self.f90flags.is_empty() {
            cmd = cmd.arg(f90flags_arg(&self.f90flags));
        }

        Ok(cmd.cwd(&request.source_dir))
    }
}

/// Split a flag string with POSIX shell-word rules.
pub fn split_flags(flags: &str) -> Result<Vec<String>, BuildError> {
    shell_words::split(flags).map_err(|source| BuildError::InvalidFlags {
        flags: flags.to_string(),
        source,
    })
}

fn platform_flags(os: Os) -> Vec<String> {
    match os {
        Os::Windows => WINDOWS_DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Join `components` under the prefix, or fall back to `bare` from PATH.
fn prefixed(prefix: Option<&Path>, components: &[&str], bare: &str) -> PathBuf {
    match prefix {
        Some(prefix) => components.iter().fold(prefix.to_path_buf(), |p, c| p.join(c)),
        None => PathBuf::from(bare),
    }
}

fn f90flags_arg(flags: &[String]) -> String {
    format!("--f90flags={}", flags.join(" "))
}
