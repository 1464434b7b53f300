//! Lifecycle audit logging.
//!
//! Every database-lifecycle event is recorded as one timestamped plaintext
//! line, both in the store-wide log and in the affected database's own log.
//! The log is append-only; each line is flushed before the call returns so
//! an abrupt exit loses at most the event in flight.

use crate::error::StoreResult;
use chrono::Local;
use parking_lot::Mutex;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The operation completed.
    Success,
    /// The operation was rejected or failed.
    Error,
}

impl AuditOutcome {
    /// Returns the outcome string used in log lines.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only audit log backed by a single file.
///
/// Line format: `[YYYY-MM-DD HH:MM:SS] <SUCCESS|ERROR> <operation> <detail>`.
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<BufWriter<std::fs::File>>,
}

impl AuditLog {
    /// Opens the log file for appending, creating it if absent.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Appends one timestamped line and flushes it.
    pub fn record(
        &self,
        outcome: AuditOutcome,
        operation: &str,
        detail: &str,
    ) -> StoreResult<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut writer = self.writer.lock();
        writeln!(writer, "[{timestamp}] {outcome} {operation} {detail}")?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog").field("path", &self.path).finish()
    }
}
