//! Per-artifact mutual exclusion.
//!
//! Two builds writing the same artifact would race between the stale-file
//! removal of one and the compiler output of the other. Builds lock the
//! artifact path for their whole duration; builds of different artifacts
//! run concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-artifact locks.
#[derive(Debug, Default)]
pub struct ArtifactLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

/// Process-wide registry shared by all builders.
static GLOBAL_LOCKS: LazyLock<ArtifactLocks> = LazyLock::new(ArtifactLocks::default);

/// Held while a build owns its artifact path.
#[derive(Debug)]
pub struct ArtifactGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ArtifactLocks {
    /// The process-wide registry.
    pub fn global() -> &'static ArtifactLocks {
        &GLOBAL_LOCKS
    }

    /// Wait until no other build holds `artifact`, then take it.
    pub async fn acquire(&self, artifact: &Path) -> ArtifactGuard {
        let key = lock_key(artifact);
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody holds or waits on.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        if lock.try_lock().is_err() {
            tracing::debug!("waiting for another build of {}", key.display());
        }

        ArtifactGuard {
            _guard: lock.lock_owned().await,
        }
    }
}

/// Key locks on the absolute path so `gen/m.so` and `./gen/m.so` collide.
fn lock_key(artifact: &Path) -> PathBuf {
    let absolute = if artifact.is_absolute() {
        artifact.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(artifact))
            .unwrap_or_else(|_| artifact.to_path_buf())
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(dir), Some(name)) => dir
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}
