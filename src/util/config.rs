//! Configuration file support for nativemod.
//!
//! nativemod supports two configuration file locations:
//! - Global: `~/.nativemod/config.toml` - User-wide defaults
//! - Project: `<source dir>/.nativemod/config.toml` - Overrides for one
//!   directory of generated sources
//!
//! Project config takes precedence over global config, field by field.
//!
//! ```toml
//! [toolchain]
//! python_prefix = "/opt/conda"
//! fortran_flags = "--fcompiler=gnu95"
//! f90flags = ["-ffree-line-length-none", "-fno-stack-arrays"]
//! cc = "/usr/bin/gcc-13"
//!
//! [build]
//! timeout_secs = 900
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the per-directory and per-user configuration directory.
pub const CONFIG_DIR_NAME: &str = ".nativemod";

/// nativemod configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Toolchain overrides
    pub toolchain: ToolchainSection,

    /// Build settings
    pub build: BuildSection,
}

/// Toolchain overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSection {
    /// Python installation prefix providing f2py
    pub python_prefix: Option<PathBuf>,

    /// f2py program (replaces the platform-derived invocation)
    pub f2py: Option<PathBuf>,

    /// Flag string used for Fortran builds without a compiler override
    pub fortran_flags: Option<String>,

    /// Flags forwarded to gfortran via `--f90flags`
    pub f90flags: Option<Vec<String>>,

    /// C compiler (default: gcc)
    pub cc: Option<PathBuf>,

    /// MSVC developer environment script (default: vcvars64.bat)
    pub vcvars: Option<PathBuf>,

    /// MSVC compiler (default: cl)
    pub cl: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Kill a compiler that runs longer than this
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't
    /// exist or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let tc = other.toolchain;
        if tc.python_prefix.is_some() {
            self.toolchain.python_prefix = tc.python_prefix;
        }
        if tc.f2py.is_some() {
            self.toolchain.f2py = tc.f2py;
        }
        if tc.fortran_flags.is_some() {
            self.toolchain.fortran_flags = tc.fortran_flags;
        }
        if tc.f90flags.is_some() {
            self.toolchain.f90flags = tc.f90flags;
        }
        if tc.cc.is_some() {
            self.toolchain.cc = tc.cc;
        }
        if tc.vcvars.is_some() {
            self.toolchain.vcvars = tc.vcvars;
        }
        if tc.cl.is_some() {
            self.toolchain.cl = tc.cl;
        }

        if other.build.timeout_secs.is_some() {
            self.build.timeout_secs = other.build.timeout_secs;
        }
    }

    /// Compiler timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.build.timeout_secs.map(Duration::from_secs)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Load the configuration that applies to builds in `source_dir`.
pub fn load_for_dir(source_dir: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(source_dir))
}

/// Get the global config directory (~/.nativemod).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.nativemod/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<source dir>/.nativemod/config.toml).
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(CONFIG_DIR_NAME).join("config.toml")
}
