//! Native module builder.
//!
//! [`NativeModuleBuilder`] owns the platform, the resolved toolchain
//! settings and a [`ProcessRunner`]. Its two operations live in
//! [`fortran`] and [`c`]; both follow the same sequence:
//!
//! 1. validate the request
//! 2. select the toolchain and build the command
//! 3. lock the artifact path
//! 4. remove any stale artifact
//! 5. run the compiler and record the attempt in a [`BuildReport`]

pub mod c;
pub mod error;
pub mod events;
pub mod fortran;
pub mod lock;
pub mod report;
pub mod toolchain;

pub use error::BuildError;
pub use events::BuildEvent;
pub use lock::ArtifactLocks;
pub use report::{Attempt, AttemptOutcome, BuildReport};
pub use toolchain::{CommandSpec, Toolchain, ToolchainChoice, ToolchainKind, ToolchainSettings};

use crate::core::Os;
use crate::util::process::{NullSink, OutputSink, ProcessRunner, RunError, SystemRunner};

/// Whether compiler output reaches the sink as it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Forward every non-empty line while the compiler runs
    Stream,
    /// Only capture; the caller decides what to show afterwards
    Collect,
}

/// Builds native modules from generated Fortran and C sources.
#[derive(Debug)]
pub struct NativeModuleBuilder<R = SystemRunner> {
    os: Os,
    settings: ToolchainSettings,
    runner: R,
    locks: &'static ArtifactLocks,
}

impl NativeModuleBuilder<SystemRunner> {
    /// Builder for the host platform running real processes.
    pub fn host(settings: ToolchainSettings) -> Self {
        NativeModuleBuilder::new(Os::host(), settings, SystemRunner::new())
    }
}

impl<R: ProcessRunner> NativeModuleBuilder<R> {
    /// Create a builder for `os`.
    pub fn new(os: Os, settings: ToolchainSettings, runner: R) -> Self {
        NativeModuleBuilder {
            os,
            settings,
            runner,
            locks: ArtifactLocks::global(),
        }
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn settings(&self) -> &ToolchainSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run one toolchain command and record how it ended.
    ///
    /// Launch failures and timeouts are reported to `sink` and the log,
    /// never returned as errors.
    async fn attempt(
        &self,
        kind: ToolchainKind,
        command: &CommandSpec,
        sink: &dyn OutputSink,
        mode: OutputMode,
    ) -> Attempt {
        let shown = command.display();
        tracing::debug!("running: {}", shown);

        let output_sink: &dyn OutputSink = match mode {
            OutputMode::Stream => sink,
            OutputMode::Collect => &NullSink,
        };

        let outcome = match self.runner.run(command, output_sink).await {
            Ok(result) => {
                tracing::debug!("{} exited with {:?}", kind, result.exit_code);
                AttemptOutcome::Exited {
                    exit_code: result.exit_code,
                    output: result.output,
                }
            }
            Err(RunError::Spawn { program, source }) => {
                let message = format!("Execution failed: could not launch `{}`: {}", program.display(), source);
                tracing::error!("{}", message);
                sink.diagnostic(&message);
                AttemptOutcome::SpawnFailed { message }
            }
            Err(RunError::TimedOut { program, after }) => {
                let message = format!(
                    "`{}` was killed after running for {:.1}s",
                    program.display(),
                    after.as_secs_f64()
                );
                tracing::error!("{}", message);
                sink.diagnostic(&message);
                AttemptOutcome::TimedOut { after }
            }
            Err(e @ RunError::Wait { .. }) => {
                let message = e.to_string();
                tracing::error!("{}", message);
                sink.diagnostic(&message);
                AttemptOutcome::Interrupted { message }
            }
        };

        Attempt {
            toolchain: kind,
            command: shown,
            outcome,
        }
    }
}
