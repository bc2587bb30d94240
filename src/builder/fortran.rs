//! Fortran module builds through f2py.

use std::path::{Path, PathBuf};

use crate::builder::error::BuildError;
use crate::builder::report::{AttemptOutcome, BuildReport};
use crate::builder::toolchain::{fortran_toolchain, Toolchain, ToolchainKind};
use crate::builder::{NativeModuleBuilder, OutputMode};
use crate::core::{BuildRequest, ModuleLanguage};
use crate::util::fs::{matching_files, remove_file_if_exists};
use crate::util::process::{OutputSink, ProcessRunner};

/// Extensions f2py gives the compiled module: `.pyd` on Windows, `.so`
/// (usually interpreter-tagged) elsewhere.
const MODULE_EXTENSIONS: &[&str] = &["pyd", "so"];

impl<R: ProcessRunner> NativeModuleBuilder<R> {
    /// Compile `<name>.f90` together with `functionmodule.f90` into the
    /// Python extension module `<name>_compiledF90`.
    ///
    /// Compiler output is streamed to `sink` while f2py runs. A non-zero
    /// exit or a launch failure is recorded in the report and logged; only
    /// request and filesystem problems are returned as errors.
    pub async fn build_fortran_module(
        &self,
        request: &BuildRequest,
        sink: &dyn OutputSink,
    ) -> Result<BuildReport, BuildError> {
        request.validate()?;

        let toolchain = fortran_toolchain(self.os, &self.settings);
        let command = toolchain.compile_command(request)?;
        let artifact = request.fortran_artifact_path();

        let mut report = BuildReport::new(
            ModuleLanguage::Fortran,
            request.module_name.clone(),
            artifact.clone(),
        );

        let _guard = self.locks.acquire(&artifact).await;

        let removed = remove_stale_modules(request)?;
        if removed > 0 {
            tracing::debug!("removed {} stale module(s) for {}", removed, request.module_name);
        }

        for source in request.fortran_sources() {
            if !request.source_dir.join(&source).is_file() {
                tracing::warn!(
                    "{} not found in {}",
                    source,
                    request.source_dir.display()
                );
            }
        }

        tracing::info!(
            "compiling {} with {}",
            request.fortran_module_name(),
            toolchain.choice().program.display()
        );

        let attempt = self
            .attempt(ToolchainKind::F2py, &command, sink, OutputMode::Stream)
            .await;

        if let AttemptOutcome::Exited { exit_code, .. } = attempt.outcome {
            if exit_code != Some(0) {
                tracing::warn!(
                    "f2py exited with {} for {}",
                    exit_code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c)),
                    request.module_name
                );
            }
        }

        report.attempts.push(attempt);
        report.produced_artifact = produced_module(request)?;

        Ok(report)
    }
}

/// Remove the `.pyd` and any interpreter-tagged module left by earlier builds.
fn remove_stale_modules(request: &BuildRequest) -> Result<usize, BuildError> {
    let mut removed = usize::from(remove_file_if_exists(&request.fortran_artifact_path())?);
    for path in module_candidates(request)? {
        if remove_file_if_exists(&path)? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// The module file a build left behind, preferring the `.pyd`.
fn produced_module(request: &BuildRequest) -> Result<Option<PathBuf>, BuildError> {
    let pyd = request.fortran_artifact_path();
    if pyd.is_file() {
        return Ok(Some(pyd));
    }
    Ok(module_candidates(request)?.into_iter().next())
}

fn module_candidates(request: &BuildRequest) -> Result<Vec<PathBuf>, BuildError> {
    let pattern = format!("{}.*", request.fortran_module_name());
    let files = matching_files(&request.source_dir, &pattern)?;
    Ok(files.into_iter().filter(|p| has_module_extension(p)).collect())
}

fn has_module_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MODULE_EXTENSIONS.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::ToolchainSettings;
    use crate::core::Os;
    use crate::test_support::{MockResponse, MockRunner, ModuleFixture, RecordingSink};
    use tempfile::TempDir;

    fn settings() -> ToolchainSettings {
        ToolchainSettings {
            python_prefix: Some(PathBuf::from("/opt/py")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_removes_stale_module_before_running() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("pendulum").write_to(tmp.path()).unwrap();
        let pyd = dir.join("pendulum_compiledF90.pyd");
        std::fs::write(&pyd, "stale").unwrap();

        let runner = MockRunner::new()
            .expect_prefix("/opt/py/bin/f2py", MockResponse::success("Building modules..."))
            .watch(&pyd);
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);
        let sink = RecordingSink::new();

        let report = builder
            .build_fortran_module(&BuildRequest::new("pendulum", &dir), &sink)
            .await
            .unwrap();

        let invocations = builder.runner().invocations();
        assert_eq!(invocations.len(), 1);
        assert!(!invocations[0].watched[0].1, "stale module still present");
        assert_eq!(invocations[0].cwd.as_deref(), Some(dir.as_path()));
        assert!(report.succeeded());
        assert_eq!(report.artifact_path, pyd);
        assert_eq!(report.produced_artifact, None);
        assert_eq!(sink.lines(), vec!["Building modules..."]);
    }

    #[tokio::test]
    async fn test_command_line_on_linux() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(tmp.path()).unwrap();

        let runner = MockRunner::new().with_default(MockResponse::success(""));
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);

        builder
            .build_fortran_module(&BuildRequest::new("crane", &dir), &RecordingSink::new())
            .await
            .unwrap();

        let invocation = &builder.runner().invocations()[0];
        assert_eq!(invocation.program, PathBuf::from("/opt/py/bin/f2py"));
        assert_eq!(
            invocation.args,
            vec![
                "-c",
                "functionmodule.f90",
                "crane.f90",
                "-m",
                "crane_compiledF90",
                "--f90flags=-ffree-line-length-none -fno-stack-arrays -fno-realloc-lhs",
            ]
        );
    }

    #[tokio::test]
    async fn test_override_replaces_windows_defaults() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(tmp.path()).unwrap();

        let runner = MockRunner::new().with_default(MockResponse::success(""));
        let builder = NativeModuleBuilder::new(Os::Windows, settings(), runner);
        let request = BuildRequest::new("crane", &dir).with_compiler_override("--compiler=msvc");

        builder
            .build_fortran_module(&request, &RecordingSink::new())
            .await
            .unwrap();

        let invocation = &builder.runner().invocations()[0];
        assert_eq!(invocation.program, Path::new("/opt/py").join("python.exe"));
        assert!(invocation.args.contains(&"--compiler=msvc".to_string()));
        assert!(!invocation.args.contains(&"--compiler=mingw32".to_string()));
        assert!(invocation.args.last().unwrap().starts_with("--f90flags="));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(tmp.path()).unwrap();

        let runner = MockRunner::new().with_default(MockResponse::failure(
            1,
            "crane.f90:3:5: Error: Symbol 'x' has no IMPLICIT type",
        ));
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);
        let sink = RecordingSink::new();

        let report = builder
            .build_fortran_module(&BuildRequest::new("crane", &dir), &sink)
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.exit_code(), Some(1));
        assert!(report.captured_output().contains("IMPLICIT"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(tmp.path()).unwrap();

        let runner = MockRunner::new().with_default(MockResponse::SpawnFailure);
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);
        let sink = RecordingSink::new();

        let report = builder
            .build_fortran_module(&BuildRequest::new("crane", &dir), &sink)
            .await
            .unwrap();

        assert!(report.spawn_failed());
        assert_eq!(report.artifact_path, dir.join("crane_compiledF90.pyd"));
        assert!(sink.diagnostics()[0].starts_with("Execution failed"));
    }

    #[tokio::test]
    async fn test_finds_tagged_module() {
        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(tmp.path()).unwrap();
        let stale = dir.join("crane_compiledF90.cpython-310-x86_64-linux-gnu.so");
        std::fs::write(&stale, "old").unwrap();

        let runner = MockRunner::new()
            .with_default(
                MockResponse::success("").creating("crane_compiledF90.cpython-311-x86_64-linux-gnu.so"),
            )
            .watch(&stale);
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);

        let report = builder
            .build_fortran_module(&BuildRequest::new("crane", &dir), &RecordingSink::new())
            .await
            .unwrap();

        assert!(!builder.runner().invocations()[0].watched[0].1);
        assert_eq!(
            report.produced_artifact,
            Some(dir.join("crane_compiledF90.cpython-311-x86_64-linux-gnu.so"))
        );
    }

    #[tokio::test]
    async fn test_invalid_name_runs_nothing() {
        let tmp = TempDir::new().unwrap();
        let runner = MockRunner::new().with_default(MockResponse::success(""));
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);

        let err = builder
            .build_fortran_module(&BuildRequest::new("a&b", tmp.path()), &RecordingSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::InvalidModuleName { .. }));
        assert!(builder.runner().invocations().is_empty());
    }

    #[tokio::test]
    async fn test_bad_override_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let runner = MockRunner::new().with_default(MockResponse::success(""));
        let builder = NativeModuleBuilder::new(Os::Linux, settings(), runner);
        let request = BuildRequest::new("crane", tmp.path()).with_compiler_override("--opt='-O3");

        let err = builder
            .build_fortran_module(&request, &RecordingSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::InvalidFlags { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_builds_with_stub_f2py() {
        use crate::test_support::stubs;
        use crate::util::process::SystemRunner;

        let tmp = TempDir::new().unwrap();
        let dir = ModuleFixture::fortran("crane").write_to(&tmp.path().join("gen")).unwrap();
        let f2py = stubs::f2py(tmp.path()).unwrap();

        let settings = ToolchainSettings {
            f2py: Some(f2py),
            ..Default::default()
        };
        let builder = NativeModuleBuilder::new(Os::Linux, settings, SystemRunner::new());
        let sink = RecordingSink::new();

        let report = builder
            .build_fortran_module(&BuildRequest::new("crane", &dir), &sink)
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(
            report.produced_artifact,
            Some(dir.join("crane_compiledF90.cpython-stub.so"))
        );
        assert_eq!(sink.lines(), vec!["Reading fortran codes...", "Building modules..."]);
    }
}
