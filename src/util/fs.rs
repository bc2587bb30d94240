//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions};

use crate::builder::error::BuildError;

/// Remove a file if it exists. Returns whether a file was removed.
///
/// Anything that is not a file (a directory in the artifact's place) is
/// left alone; the compiler reports it when it tries to write there.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, BuildError> {
    if fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir()) {
        tracing::debug!("{} is a directory, not removing it", path.display());
        return Ok(false);
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(BuildError::RemoveArtifact {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Files in `dir` whose names match `pattern` (a glob over the file name).
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BuildError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped, pattern);

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = glob_with(&full, options).map_err(|source| BuildError::ArtifactPattern {
        pattern: full.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("glob error: {}", e),
        }
    }

    files.sort();
    Ok(files)
}
