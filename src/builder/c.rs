//! C module builds: GCC, with MSVC as the Windows fallback.

use crate::builder::error::BuildError;
use crate::builder::report::BuildReport;
use crate::builder::toolchain::{c_toolchains, Toolchain, ToolchainKind};
use crate::builder::{NativeModuleBuilder, OutputMode};
use crate::core::{BuildRequest, ModuleLanguage};
use crate::util::fs::remove_file_if_exists;
use crate::util::process::{OutputSink, ProcessRunner};

/// Announced before the MSVC fallback runs.
pub const MSVC_FALLBACK_MESSAGE: &str = "Trying Visual Studio...";

impl<R: ProcessRunner> NativeModuleBuilder<R> {
    /// Compile `<name>.c` into `<name>.dll` (Windows) or `<name>.so`.
    ///
    /// Output is collected, not streamed. When the final attempt fails its
    /// output is forwarded to `sink`; on success only a confirmation note is.
    /// On Windows a failed GCC attempt is followed by exactly one MSVC
    /// attempt, and the MSVC result stands.
    ///
    /// The returned report always carries the expected artifact path, even
    /// when nothing was built.
    pub async fn build_c_module(
        &self,
        request: &BuildRequest,
        sink: &dyn OutputSink,
    ) -> Result<BuildReport, BuildError> {
        request.validate()?;

        let (gcc, msvc) = c_toolchains(self.os, &self.settings);
        let gcc_command = gcc.compile_command(request)?;
        let msvc_command = msvc
            .as_ref()
            .map(|tc| tc.compile_command(request))
            .transpose()?;

        let artifact = request.c_artifact_path(self.os);
        let mut report = BuildReport::new(ModuleLanguage::C, request.module_name.clone(), artifact.clone());

        let _guard = self.locks.acquire(&artifact).await;

        if remove_file_if_exists(&artifact)? {
            tracing::debug!("removed stale {}", artifact.display());
        }

        let source = request.c_source();
        if !request.source_dir.join(&source).is_file() {
            tracing::warn!("{} not found in {}", source, request.source_dir.display());
        }

        tracing::info!("compiling {} with {}", source, gcc.choice().program.display());

        let first = self
            .attempt(ToolchainKind::Gcc, &gcc_command, sink, OutputMode::Collect)
            .await;
        let gcc_succeeded = first.succeeded();
        report.attempts.push(first);

        if !gcc_succeeded {
            if let Some(command) = msvc_command {
                sink.diagnostic(MSVC_FALLBACK_MESSAGE);
                tracing::info!("gcc failed for {}, falling back to MSVC", source);
                let fallback = self
                    .attempt(ToolchainKind::Msvc, &command, sink, OutputMode::Collect)
                    .await;
                report.attempts.push(fallback);
            }
        }

        if report.succeeded() {
            sink.note(&format!("Compilation of \"{}\" successful", source));
        } else {
            for line in report.captured_output().lines().filter(|l| !l.is_empty()) {
                sink.line(line);
            }
        }

        report.produced_artifact = artifact.is_file().then(|| artifact.clone());

        Ok(report)
    }
}
