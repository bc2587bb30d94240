//! `nativemod toolchain` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::ToolchainArgs;
use nativemod::builder::toolchain::{choices_for, ToolchainChoice, ToolchainSettings};
use nativemod::core::Os;
use nativemod::ops::build::host_settings;
use nativemod::util::config::load_for_dir;
use nativemod::util::Shell;

pub fn execute(args: ToolchainArgs, shell: &Arc<Shell>) -> Result<()> {
    let os = args.os.unwrap_or_else(Os::host);
    let config = load_for_dir(&args.dir);

    // Only detect the Python prefix for the host; it means nothing elsewhere.
    let settings = if os == Os::host() {
        host_settings(&config)
    } else {
        ToolchainSettings::from_config(&config.toolchain)
    };

    let choices = choices_for(os, &settings);

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "toolchains",
            "os": os,
            "python_prefix": settings.python_prefix,
            "toolchains": choices,
        }));
        return Ok(());
    }

    println!("Toolchains for {}:", os);
    println!();
    for choice in &choices {
        print_choice(choice);
    }

    if let Some(prefix) = &settings.python_prefix {
        println!("Python prefix: {}", prefix.display());
    }

    Ok(())
}

fn print_choice(choice: &ToolchainChoice) {
    println!("  {}:", choice.kind);
    println!("    Program:   {}", choice.program.display());
    if !choice.leading_args.is_empty() {
        println!("    Arguments: {}", shell_words::join(&choice.leading_args));
    }
    if !choice.fixed_flags.is_empty() {
        println!("    Flags:     {}", shell_words::join(&choice.fixed_flags));
    }
    println!("    Produces:  .{}", choice.extension);
    println!();
}
