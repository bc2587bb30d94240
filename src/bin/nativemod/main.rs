//! nativemod CLI - builds generated Fortran and C model code

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nativemod::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Shell status lines cover normal progress; the log only carries
    // warnings unless asked for more.
    let default_filter = if cli.verbose {
        "nativemod=debug"
    } else if cli.quiet {
        "nativemod=error"
    } else {
        "nativemod=warn"
    };
    let filter = EnvFilter::try_from_env("NATIVEMOD_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    ));

    match cli.command {
        Commands::Fortran(args) => commands::fortran::execute(args, &shell).await,
        Commands::C(args) => commands::c::execute(args, &shell).await,
        Commands::Toolchain(args) => commands::toolchain::execute(args, &shell),
        Commands::Doctor(args) => commands::doctor::execute(args, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
