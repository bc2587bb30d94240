//! Terminal and JSON output for the command-line front end.
//!
//! Human output goes to stderr as right-aligned status labels followed by a
//! message, with compiler lines indented beneath them. With
//! `--message-format json` nothing human-readable is printed; build events
//! go to stdout one object per line instead.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::events::BuildEvent;
use crate::core::ModuleLanguage;
use crate::util::process::OutputSink;

/// Column the status labels are right-aligned to.
const LABEL_WIDTH: usize = 12;

/// How much human output to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    #[default]
    Normal,
    /// Command lines and debug logging, no spinner
    Verbose,
}

/// When to color the status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Color when stderr is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(format!("unknown color mode `{}` (use auto, always or never)", other)),
        }
    }
}

/// Label printed in front of a human status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Compiling,
    Finished,
    Note,
    Warning,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Compiling => "Compiling",
            Status::Finished => "Finished",
            Status::Note => "Note",
            Status::Warning => "Warning",
        }
    }

    /// Bold ANSI color of the label.
    fn ansi(self) -> &'static str {
        match self {
            Status::Compiling => "\x1b[1;36m",
            Status::Finished => "\x1b[1;32m",
            Status::Note => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
        }
    }
}

/// Output front end shared by all commands.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    json: bool,
    color: bool,
}

impl Shell {
    /// Build the shell from the global flags. JSON output wins over
    /// `--quiet` and `--verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let verbosity = match (json, quiet, verbose) {
            (true, _, _) => Verbosity::Normal,
            (false, true, _) => Verbosity::Quiet,
            (false, false, true) => Verbosity::Verbose,
            (false, false, false) => Verbosity::Normal,
        };
        let color = !json
            && match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            };

        Shell { verbosity, json, color }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn use_color(&self) -> bool {
        self.color
    }

    /// Whether status lines are printed at all.
    fn prints_status(&self) -> bool {
        !self.json && !self.is_quiet()
    }

    /// Print `<label> <message>` to stderr.
    pub fn status(&self, status: Status, message: impl Display) {
        if self.prints_status() {
            eprintln!("{} {}", self.label(status), message);
        }
    }

    /// Print one line of compiler output under the message column.
    pub fn output_line(&self, line: &str) {
        if self.prints_status() {
            eprintln!("{:LABEL_WIDTH$} {}", "", line);
        }
    }

    /// Write one JSON event to stdout. Does nothing in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.json {
            return;
        }
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", event).and_then(|_| stdout.flush()) {
            tracing::debug!("failed to write JSON event: {}", e);
        }
    }

    /// Print a start line now and time the step until [`Span::finish`].
    pub fn span(self: &Arc<Self>, status: Status, message: impl Display) -> Span {
        self.status(status, message);
        Span {
            shell: Arc::clone(self),
            started: Instant::now(),
        }
    }

    fn label(&self, status: Status) -> String {
        if self.color {
            format!("{}{:>LABEL_WIDTH$}\x1b[0m", status.ansi(), status.label())
        } else {
            format!("{:>LABEL_WIDTH$}", status.label())
        }
    }
}

/// A timed step started by [`Shell::span`].
///
/// Dropping it without calling [`Span::finish`] prints nothing.
pub struct Span {
    shell: Arc<Shell>,
    started: Instant,
}

impl Span {
    /// Print `Finished <message> in <duration>`.
    pub fn finish(self, message: impl Display) {
        let elapsed = format_duration(self.started.elapsed());
        self.shell
            .status(Status::Finished, format!("{} in {}", message, elapsed));
    }
}

/// [`OutputSink`] that reports one module's build through a [`Shell`].
///
/// C builds collect compiler output until gcc has finished, so a spinner
/// shows that something is running. Fortran builds stream f2py's output as
/// it arrives and get no spinner.
pub struct ShellSink {
    shell: Arc<Shell>,
    module: String,
    spinner: Option<ProgressBar>,
}

impl ShellSink {
    pub fn new(shell: &Arc<Shell>, module: impl Into<String>, language: ModuleLanguage) -> Self {
        let module = module.into();
        let wants_spinner = language == ModuleLanguage::C
            && shell.verbosity == Verbosity::Normal
            && !shell.json
            && io::stderr().is_terminal();

        ShellSink {
            spinner: wants_spinner.then(|| spinner(&module)),
            shell: Arc::clone(shell),
            module,
        }
    }

    /// Clear the spinner, if one is showing.
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }

    /// Print with the spinner hidden so lines don't tear through it.
    fn print(&self, f: impl FnOnce()) {
        match &self.spinner {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl Drop for ShellSink {
    fn drop(&mut self) {
        self.finish();
    }
}

fn spinner(module: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} building {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(module.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

impl OutputSink for ShellSink {
    fn line(&self, line: &str) {
        if self.shell.json {
            self.shell
                .json_event(&BuildEvent::output(&self.module, line).to_value());
        } else {
            self.print(|| self.shell.output_line(line));
        }
    }

    fn note(&self, message: &str) {
        if self.shell.json {
            self.shell
                .json_event(&BuildEvent::diagnostic("note", message).to_value());
        } else {
            self.print(|| self.shell.status(Status::Note, message));
        }
    }

    fn diagnostic(&self, message: &str) {
        if self.shell.json {
            self.shell
                .json_event(&BuildEvent::diagnostic("warning", message).to_value());
        } else {
            self.print(|| self.shell.status(Status::Warning, message));
        }
    }
}

/// `0.42s` under a minute, `1.5m` above.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
