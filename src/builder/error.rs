//! Errors raised by the native module builder.
//!
//! Only problems with the request itself or with the filesystem surface here.
//! A compiler that cannot be launched, exits non-zero, or times out is not an
//! error: it is recorded in the [`BuildReport`](super::report::BuildReport).

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("invalid module name `{name}`")]
    #[diagnostic(
        code(nativemod::request::invalid_name),
        help("Module names must be identifiers: a letter or `_` followed by letters, digits, or `_`")
    )]
    InvalidModuleName { name: String },

    #[error("source directory does not exist: {}", path.display())]
    #[diagnostic(code(nativemod::request::missing_dir))]
    SourceDirMissing { path: PathBuf },

    #[error("could not parse compiler flags `{flags}`")]
    #[diagnostic(
        code(nativemod::request::invalid_flags),
        help("Check for unbalanced quotes in the flag string")
    )]
    InvalidFlags {
        flags: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("failed to remove stale artifact {}", path.display())]
    #[diagnostic(code(nativemod::fs::remove_artifact))]
    RemoveArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact pattern `{pattern}`")]
    #[diagnostic(code(nativemod::fs::pattern))]
    ArtifactPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
