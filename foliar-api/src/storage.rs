//! Request-scoped temp files with unconditional cleanup
//!
//! Every request gets a uniquely named input/output pair under the
//! configured directory; dropping the pair removes both paths, so cleanup
//! holds on success, failure, and panic alike. Stale files from interrupted
//! runs are swept at server startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::warn;
use uuid::Uuid;

/// Allocates per-request temp file pairs under one directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TempStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a uniquely named input/output pair for one request.
    pub fn allocate(&self) -> io::Result<RequestFiles> {
        fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4();
        Ok(RequestFiles {
            input: self.dir.join(format!("{id}_input.pdf")),
            output: self.dir.join(format!("{id}_foliado.pdf")),
        })
    }

    /// Remove files older than `max_age`. Returns how many were deleted.
    pub fn sweep_stale(&self, max_age: Duration) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let cutoff = SystemTime::now() - max_age;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
                continue;
            };
            if modified < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(err) => {
                        warn!("failed to remove stale temp file {}: {err}", path.display());
                    }
                }
            }
        }
        removed
    }
}

/// Input/output path pair for one request. Both files are deleted on drop.
#[derive(Debug)]
pub struct RequestFiles {
    input: PathBuf,
    output: PathBuf,
}

impl RequestFiles {
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for RequestFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!("failed to remove temp file {}: {err}", path.display()),
            }
        }
    }
}
