//! Implementation of `nativemod fortran` and `nativemod c`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::builder::{BuildReport, NativeModuleBuilder, ToolchainSettings};
use crate::core::{BuildRequest, ModuleLanguage, Os};
use crate::util::config::{load_for_dir, Config};
use crate::util::process::{OutputSink, SystemRunner};

/// Options for a single module build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub language: ModuleLanguage,

    /// Module name (source file stem)
    pub module_name: String,

    /// Directory holding the sources and receiving the artifact
    pub source_dir: PathBuf,

    /// Flags replacing the platform defaults (Fortran only)
    pub compiler_override: Option<String>,

    /// Timeout from the command line, overriding the configured one
    pub timeout: Option<Duration>,
}

impl BuildOptions {
    pub fn new(language: ModuleLanguage, module_name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        BuildOptions {
            language,
            module_name: module_name.into(),
            source_dir: source_dir.into(),
            compiler_override: None,
            timeout: None,
        }
    }

    fn request(&self) -> BuildRequest {
        let request = BuildRequest::new(&self.module_name, &self.source_dir);
        match &self.compiler_override {
            Some(flags) => request.with_compiler_override(flags),
            None => request,
        }
    }
}

/// A finished build and how long it took.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub report: BuildReport,
    pub duration: Duration,
}

/// Toolchain settings for the host from a loaded configuration.
pub fn host_settings(config: &Config) -> ToolchainSettings {
    ToolchainSettings::from_config(&config.toolchain).with_detected_prefix(Os::host())
}

/// Builder for `source_dir` on the host, configured from its config files.
///
/// `timeout` overrides the configured `build.timeout_secs`.
pub fn host_builder(source_dir: &Path, timeout: Option<Duration>) -> NativeModuleBuilder<SystemRunner> {
    let config = load_for_dir(source_dir);
    let runner = SystemRunner::new().with_timeout(timeout.or_else(|| config.timeout()));
    NativeModuleBuilder::new(Os::host(), host_settings(&config), runner)
}

/// Build one module, sending output to `sink`.
pub async fn build(options: &BuildOptions, sink: &dyn OutputSink) -> Result<BuildOutcome> {
    let start = Instant::now();
    let builder = host_builder(&options.source_dir, options.timeout);
    let request = options.request();

    tracing::debug!(
        os = %builder.os(),
        timeout = ?builder.runner().timeout(),
        "building {} module `{}` in {}",
        options.language,
        options.module_name,
        options.source_dir.display()
    );

    let report = match options.language {
        ModuleLanguage::Fortran => builder.build_fortran_module(&request, sink).await,
        ModuleLanguage::C => builder.build_c_module(&request, sink).await,
    }
    .with_context(|| format!("failed to build {} module `{}`", options.language, options.module_name))?;

    Ok(BuildOutcome {
        report,
        duration: start.elapsed(),
    })
}
