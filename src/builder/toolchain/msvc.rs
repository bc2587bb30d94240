//! MSVC toolchain implementation.
//!
//! `cl.exe` only works inside an environment prepared by the developer
//! environment script, so the script and the compiler run as one chain
//! under `cmd /S /C "..."`. This is the only command nativemod runs through
//! a shell. The chain is quoted here for `cmd` and passed through verbatim,
//! so paths with spaces survive; the module name is a validated identifier.

use std::path::PathBuf;

use crate::builder::error::BuildError;
use crate::core::BuildRequest;

use super::{CommandSpec, Toolchain, ToolchainChoice, ToolchainKind};

/// MSVC toolchain (Windows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsvcToolchain {
    /// Path to vcvars64.bat
    pub vcvars: PathBuf,
    /// Path to cl.exe (compiler)
    pub cl: PathBuf,
}

impl MsvcToolchain {
    /// Create a new MSVC toolchain.
    pub fn new(vcvars: PathBuf, cl: PathBuf) -> Self {
        MsvcToolchain { vcvars, cl }
    }

    fn leading_args(&self) -> Vec<String> {
        vec![
            "/S".to_string(),
            "/C".to_string(),
            self.vcvars.display().to_string(),
            "&&".to_string(),
            self.cl.display().to_string(),
        ]
    }

    /// The `/C` operand: `"<vcvars> && <cl> /LD <source>"`.
    ///
    /// With `/S`, cmd strips exactly the outer pair of quotes and runs the
    /// rest, so quoted paths inside stay intact.
    fn chain(&self, c_source: &str) -> String {
        format!(
            "\"{} && {} /LD {}\"",
            cmd_quote(&self.vcvars.display().to_string()),
            cmd_quote(&self.cl.display().to_string()),
            cmd_quote(c_source),
        )
    }
}

/// Quote a word for cmd if it contains spaces or cmd metacharacters.
fn cmd_quote(word: &str) -> String {
    if word.is_empty() || word.contains([' ', '\t', '&', '(', ')', '^', '|', '<', '>']) {
        format!("\"{}\"", word)
    } else {
        word.to_string()
    }
}

impl Toolchain for MsvcToolchain {
    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Msvc
    }

    fn choice(&self) -> ToolchainChoice {
        ToolchainChoice {
            kind: ToolchainKind::Msvc,
            program: PathBuf::from("cmd"),
            leading_args: self.leading_args(),
            fixed_flags: vec!["/LD".to_string()],
            extension: "dll",
        }
    }

    fn compile_command(&self, request: &BuildRequest) -> Result<CommandSpec, BuildError> {
        let cmd = CommandSpec::new("cmd")
            .args(["/S", "/C"])
            .arg(self.chain(&request.c_source()))
            .verbatim()
            .cwd(&request.source_dir);

        Ok(cmd)
    }
}
