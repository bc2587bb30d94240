//! GCC toolchain implementation.

use std::path::PathBuf;

use crate::builder::error::BuildError;
use crate::core::{BuildRequest, Os};

use super::{CommandSpec, Toolchain, ToolchainChoice, ToolchainKind};

const LEADING_FLAGS: [&str; 2] = ["-Ofast", "-shared"];

/// GCC producing a shared library in one compile-and-link step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GccToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Platform the library is built for
    pub os: Os,
}

impl GccToolchain {
    /// Create a new GCC toolchain.
    pub fn new(cc: PathBuf, os: Os) -> Self {
        GccToolchain { cc, os }
    }

    /// Flags placed after the source file.
    fn trailing_flags(&self) -> Vec<String> {
        let mut flags = vec!["-fPIC".to_string()];

        // Apple clang needs this to accept __declspec in generated sources.
        if self.os == Os::Darwin {
            flags.push("-fdeclspec".to_string());
        }

        flags
    }
}

impl Toolchain for GccToolchain {
    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Gcc
    }

    fn choice(&self) -> ToolchainChoice {
        ToolchainChoice {
            kind: ToolchainKind::Gcc,
            program: self.cc.clone(),
            leading_args: LEADING_FLAGS.iter().map(|s| s.to_string()).collect(),
            fixed_flags: self.trailing_flags(),
            extension: self.os.shared_lib_extension(),
        }
    }

    fn compile_command(&self, request: &BuildRequest) -> Result<CommandSpec, BuildError> {
        let output = format!(
            "{}.{}",
            request.module_name,
            self.os.shared_lib_extension()
        );

        let cmd = CommandSpec::new(&self.cc)
            .args(LEADING_FLAGS.iter().copied())
            .arg(request.c_source())
            .args(self.trailing_flags())
            .arg("-o")
            .arg(output)
            .cwd(&request.source_dir);

        Ok(cmd)
    }
}
