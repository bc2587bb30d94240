//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nativemod::core::Os;
use nativemod::util::shell::ColorChoice;

/// nativemod - build generated Fortran and C model code into native modules
#[derive(Parser)]
#[command(name = "nativemod")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show command lines and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for build messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Status lines on stderr
    Human,
    /// One JSON event per line on stdout
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile <MODULE>.f90 and functionmodule.f90 with f2py
    Fortran(FortranArgs),

    /// Compile <MODULE>.c into a shared library
    C(CArgs),

    /// Show the toolchains used on a platform
    Toolchain(ToolchainArgs),

    /// Check that the toolchains can be found
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct FortranArgs {
    /// Module name (source file stem)
    pub module: String,

    /// Directory holding the sources; the module is written here too
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// f2py flags replacing the platform defaults
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
    pub compiler: Option<String>,

    /// Kill the compiler after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with an error when f2py fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct CArgs {
    /// Module name (source file stem)
    pub module: String,

    /// Directory holding the source; the library is written here too
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Kill the compiler after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// Platform to show (windows, linux, darwin, other); defaults to the host
    #[arg(long)]
    pub os: Option<Os>,

    /// Directory whose config files apply
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Directory whose config files apply
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Check the tools another platform would need
    #[arg(long)]
    pub os: Option<Os>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
