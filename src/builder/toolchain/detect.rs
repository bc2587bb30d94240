//! Toolchain detection functions.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::Os;

use super::{c_toolchains, fortran_toolchain, Toolchain, ToolchainSettings};

/// Detect the Python installation prefix providing f2py.
///
/// Searches in this order:
/// 1. `VIRTUAL_ENV`
/// 2. `CONDA_PREFIX`
/// 3. The installation owning the first `python3`/`python` on PATH
pub fn detect_python_prefix(os: Os) -> Option<PathBuf> {
    python_prefix_from(
        os,
        |key| std::env::var_os(key).map(PathBuf::from),
        |name| which::which(name).ok(),
    )
}

fn python_prefix_from(
    os: Os,
    env: impl Fn(&str) -> Option<PathBuf>,
    find: impl Fn(&str) -> Option<PathBuf>,
) -> Option<PathBuf> {
    for key in ["VIRTUAL_ENV", "CONDA_PREFIX"] {
        if let Some(prefix) = env(key).filter(|p| !p.as_os_str().is_empty()) {
            tracing::debug!("using Python prefix from {}", key);
            return Some(prefix);
        }
    }

    let interpreter = ["python3", "python"].into_iter().find_map(&find)?;

    // A venv's interpreter is a link to the base install; the venv is the prefix.
    if let Some(venv) = prefix_of_interpreter(os, &interpreter).filter(|p| p.join("pyvenv.cfg").is_file()) {
        return Some(venv);
    }

    let interpreter = interpreter.canonicalize().unwrap_or(interpreter);
    prefix_of_interpreter(os, &interpreter)
}

/// `<prefix>/bin/python3` on Unix, `<prefix>/python.exe` on Windows.
fn prefix_of_interpreter(os: Os, interpreter: &Path) -> Option<PathBuf> {
    let dir = interpreter.parent()?;
    if os.is_windows() {
        return Some(dir.to_path_buf());
    }

    if dir.file_name().is_some_and(|name| name == "bin") {
        dir.parent().map(Path::to_path_buf)
    } else {
        Some(dir.to_path_buf())
    }
}

/// Result of checking whether one tool can be launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCheck {
    /// What the tool is used for
    pub role: &'static str,
    /// Program as it will be launched
    pub program: PathBuf,
    /// Resolved location, if found
    pub resolved: Option<PathBuf>,
}

impl ToolCheck {
    pub fn found(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Check every tool the toolchains for `os` would launch.
pub fn check_tools(os: Os, settings: &ToolchainSettings) -> Vec<ToolCheck> {
    let mut checks = Vec::new();

    let fortran = fortran_toolchain(os, settings).choice();
    checks.push(check("fortran", fortran.program));

    let (gcc, msvc) = c_toolchains(os, settings);
    checks.push(check("c", gcc.choice().program));

    if let Some(msvc) = msvc {
        checks.push(check("msvc environment", msvc.vcvars.clone()));
        checks.push(check("msvc compiler", msvc.cl.clone()));
    }

    checks
}

fn check(role: &'static str, program: PathBuf) -> ToolCheck {
    let resolved = if program.is_absolute() {
        program.is_file().then(|| program.clone())
    } else {
        which::which(&program).ok()
    };

    ToolCheck {
        role,
        program,
        resolved,
    }
}
