//! Append-only audit records for stamping runs
//!
//! The audit log is a collaborator of the orchestrator, injected at
//! construction so tests can substitute a fake. Records are fire-and-forget:
//! a log that cannot be written never fails the stamping operation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use tracing::warn;

use crate::overlay::Corner;

/// File name for successful runs, under the configured directory.
pub const SUCCESS_LOG: &str = "folio_success.log";

/// File name for failed runs.
pub const ERROR_LOG: &str = "folio_errors.log";

/// Receiver for stamping outcome records.
pub trait AuditLog {
    /// One completed full run: first folio, pages stamped, corner used.
    fn success(&self, start_number: u32, pages_stamped: usize, corner: Corner);

    /// One failed run, with the underlying cause when known.
    fn error(&self, message: &str, detail: Option<&str>);
}

/// Discards every record. Used by previews and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn success(&self, _start_number: u32, _pages_stamped: usize, _corner: Corner) {}

    fn error(&self, _message: &str, _detail: Option<&str>) {}
}

/// Appends timestamped lines to two files under a configured directory.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    dir: PathBuf,
}

impl FileAuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileAuditLog { dir: dir.into() }
    }

    fn append(&self, file: &str, line: &str) {
        let result = (|| -> std::io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let mut log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.dir.join(file))?;
            log.write_all(line.as_bytes())
        })();

        if let Err(err) = result {
            warn!("audit log write to {file} failed: {err}");
        }
    }
}

impl AuditLog for FileAuditLog {
    fn success(&self, start_number: u32, pages_stamped: usize, corner: Corner) {
        let last = start_number + pages_stamped.saturating_sub(1) as u32;
        let line = format!(
            "{} | SUCCESS | folios {:04}-{:04} | pages: {} | corner: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            start_number,
            last,
            pages_stamped,
            corner,
        );
        self.append(SUCCESS_LOG, &line);
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        let detail = detail.map(|d| format!(" | detail: {d}")).unwrap_or_default();
        let line = format!(
            "{} | ERROR | {message}{detail}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
        );
        self.append(ERROR_LOG, &line);
    }
}
