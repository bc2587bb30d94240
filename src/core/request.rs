//! Build requests and artifact naming.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builder::error::BuildError;
use crate::core::platform::Os;

/// Suffix appended to the module name of f2py-built modules.
pub const FORTRAN_MODULE_SUFFIX: &str = "_compiledF90";

/// Fortran source holding the generated helper functions, compiled
/// alongside every module.
pub const FORTRAN_SUPPORT_SOURCE: &str = "functionmodule.f90";

/// Source language of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleLanguage {
    Fortran,
    C,
}

impl ModuleLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleLanguage::Fortran => "fortran",
            ModuleLanguage::C => "c",
        }
    }
}

impl fmt::Display for ModuleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to build one native module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Module name; the source file stem and the base of the artifact name
    pub module_name: String,
    /// Directory holding the sources, also the output directory
    pub source_dir: PathBuf,
    /// Extra compiler flags replacing the platform defaults (Fortran only)
    pub compiler_override: Option<String>,
}

impl BuildRequest {
    /// Create a new request without a compiler override.
    pub fn new(module_name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        BuildRequest {
            module_name: module_name.into(),
            source_dir: source_dir.into(),
            compiler_override: None,
        }
    }

    /// Set the compiler override.
    pub fn with_compiler_override(mut self, flags: impl Into<String>) -> Self {
        self.compiler_override = Some(flags.into());
        self
    }

    /// Check the request before any filesystem or process work happens.
    ///
    /// The module name ends up in file names and in the MSVC `cmd /C`
    /// chain, so only identifiers are accepted.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !is_identifier(&self.module_name) {
            return Err(BuildError::InvalidModuleName {
                name: self.module_name.clone(),
            });
        }

        if !self.source_dir.is_dir() {
            return Err(BuildError::SourceDirMissing {
                path: self.source_dir.clone(),
            });
        }

        Ok(())
    }

    /// Name of the Python module f2py produces (`<name>_compiledF90`).
    pub fn fortran_module_name(&self) -> String {
        format!("{}{}", self.module_name, FORTRAN_MODULE_SUFFIX)
    }

    /// Path of the compiled Fortran module (`<dir>/<name>_compiledF90.pyd`).
    pub fn fortran_artifact_path(&self) -> PathBuf {
        self.source_dir
            .join(format!("{}.pyd", self.fortran_module_name()))
    }

    /// Path of the shared library built from `<name>.c` on `os`.
    pub fn c_artifact_path(&self, os: Os) -> PathBuf {
        c_artifact_path(&self.source_dir, &self.module_name, os)
    }

    /// Source files the Fortran path compiles, relative to the source dir.
    pub fn fortran_sources(&self) -> [String; 2] {
        [
            FORTRAN_SUPPORT_SOURCE.to_string(),
            format!("{}.f90", self.module_name),
        ]
    }

    /// Source file the C path compiles, relative to the source dir.
    pub fn c_source(&self) -> String {
        format!("{}.c", self.module_name)
    }
}

/// `<dir>/<module>.<ext>` where ext is "dll" on Windows and "so" elsewhere.
pub fn c_artifact_path(source_dir: &Path, module_name: &str, os: Os) -> PathBuf {
    source_dir.join(format!("{}.{}", module_name, os.shared_lib_extension()))
}

/// Check whether `name` is a C/Fortran style identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
