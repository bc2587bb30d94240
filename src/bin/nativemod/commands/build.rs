//! Shared driver for `nativemod fortran` and `nativemod c`.

use std::sync::Arc;

use anyhow::{bail, Result};

use nativemod::builder::{AttemptOutcome, BuildEvent, BuildReport};
use nativemod::core::{ModuleLanguage, Os};
use nativemod::ops::{self, BuildOptions};
use nativemod::util::diagnostic::{self, suggestions, Diagnostic};
use nativemod::util::shell::{format_duration, Shell, ShellSink, Status};

/// Build one module and report the outcome through `shell`.
///
/// A failed build is an error when `fail_on_error` is set, otherwise a
/// warning.
pub async fn run(options: BuildOptions, shell: &Arc<Shell>, fail_on_error: bool) -> Result<()> {
    let source = source_file(&options);

    shell.json_event(
        &BuildEvent::started(&options.module_name, options.language, Os::host().as_str()).to_value(),
    );

    let span = shell.span(
        Status::Compiling,
        format!("{} ({})", source, options.source_dir.display()),
    );

    let sink = ShellSink::new(shell, &options.module_name, options.language);
    let result = ops::build(&options, &sink).await;
    sink.finish();

    let outcome = result?;
    let report = &outcome.report;

    shell.json_event(&BuildEvent::finished(report, outcome.duration.as_millis() as u64).to_value());

    if report.succeeded() {
        let artifact = report
            .produced_artifact
            .as_ref()
            .unwrap_or(&report.artifact_path);
        span.finish(format!("`{}` -> {}", options.module_name, artifact.display()));
        return Ok(());
    }

    if !shell.is_json() && (fail_on_error || !shell.is_quiet()) {
        diagnostic::emit(&failure_diagnostic(report, &source, fail_on_error), shell.use_color());
    }

    if fail_on_error {
        bail!("could not compile `{}`", source);
    }

    Ok(())
}

fn source_file(options: &BuildOptions) -> String {
    match options.language {
        ModuleLanguage::Fortran => format!("{}.f90", options.module_name),
        ModuleLanguage::C => format!("{}.c", options.module_name),
    }
}

fn failure_diagnostic(report: &BuildReport, source: &str, fatal: bool) -> Diagnostic {
    let message = format!("failed to compile `{}`", source);
    let mut diag = if fatal {
        Diagnostic::error(message)
    } else {
        Diagnostic::warning(message)
    };

    diag = diag.with_location(report.artifact_path.with_file_name(source));

    let mut timed_out = false;
    for attempt in &report.attempts {
        let what = match &attempt.outcome {
            AttemptOutcome::Exited {
                exit_code: Some(code),
                ..
            } => format!("exited with status {}", code),
            AttemptOutcome::Exited { exit_code: None, .. } => "was terminated by a signal".to_string(),
            AttemptOutcome::SpawnFailed { message } | AttemptOutcome::Interrupted { message } => message.clone(),
            AttemptOutcome::TimedOut { after } => {
                timed_out = true;
                format!("timed out after {}", format_duration(*after))
            }
        };
        diag = diag.with_context(format!("{}: {}", attempt.toolchain, what));
    }

    let suggestion = if report.spawn_failed() {
        suggestions::TOOL_MISSING
    } else if timed_out {
        suggestions::TIMED_OUT
    } else {
        suggestions::BUILD_FAILED
    };

    diag.with_suggestion(suggestion)
}
