//! nativemod - builds generated Fortran and C model code into loadable
//! native modules
//!
//! Given a module name and the directory holding its generated sources,
//! nativemod picks the compiler toolchain for the host platform, removes any
//! stale artifact, runs the compiler and reports where the artifact is.
//!
//! ```rust,ignore
//! let report = nativemod::build_c_module("pendulum", "gen").await?;
//! if report.succeeded() {
//!     load_library(&report.artifact_path);
//! }
//! ```

use std::path::PathBuf;

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for nativemod unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted process runner, a recording
/// output sink and source fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildError, BuildReport, NativeModuleBuilder};
pub use core::{BuildRequest, ModuleLanguage, Os};
pub use util::process::{LogSink, OutputSink, ProcessRunner, SystemRunner};

/// Build `<module_name>.f90` and `functionmodule.f90` in `source_dir` into
/// the Python module `<module_name>_compiledF90`.
///
/// Uses the host toolchain and the config files that apply to `source_dir`.
/// Compiler output goes to the `tracing` log. A failed compile is reported
/// in the returned [`BuildReport`], not as an error.
pub async fn build_fortran_module(
    module_name: &str,
    source_dir: impl Into<PathBuf>,
    compiler_override: Option<&str>,
) -> Result<BuildReport, BuildError> {
    let source_dir = source_dir.into();
    let mut request = BuildRequest::new(module_name, &source_dir);
    if let Some(flags) = compiler_override {
        request = request.with_compiler_override(flags);
    }

    ops::host_builder(&source_dir, None)
        .build_fortran_module(&request, &LogSink)
        .await
}

/// Build `<module_name>.c` in `source_dir` into `<module_name>.dll` on
/// Windows or `<module_name>.so` elsewhere.
///
/// The report's `artifact_path` is set whether or not the build worked.
pub async fn build_c_module(
    module_name: &str,
    source_dir: impl Into<PathBuf>,
) -> Result<BuildReport, BuildError> {
    let source_dir = source_dir.into();
    let request = BuildRequest::new(module_name, &source_dir);

    ops::host_builder(&source_dir, None)
        .build_c_module(&request, &LogSink)
        .await
}
