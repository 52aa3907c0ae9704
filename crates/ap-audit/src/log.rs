// log.rs — Append-only JSONL audit trail.
//
// One JSON object per line, append-only, flushed after every event. The
// format is deliberately boring: jq and grep are the expected readers.
//
// The file-backed sink honors the infallible emit contract by logging a
// warning and dropping the event if the write fails; it never blocks or
// panics on the authorization path.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use crate::event::AuditEvent;
use crate::sink::AuditSink;

/// Errors from the file-backed audit trail.
#[derive(Debug, Error)]
pub enum AuditLogError {
    /// The log file could not be opened.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error while reading or writing.
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line that is not a valid event.
    #[error("malformed audit log line: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An append-only audit log backed by a JSONL file.
pub struct AuditLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl AuditLog {
    /// Open (or create) an audit log at the given path. Always appends;
    /// existing events are never overwritten.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditLogError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append one event and flush it to the OS.
    pub fn append(&mut self, event: &AuditEvent) -> Result<(), AuditLogError> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read all events from a log file, oldest first. Skips blank lines.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>, AuditLogError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditLogError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sink that appends events to a JSONL audit log.
pub struct JsonlSink {
    log: Mutex<AuditLog>,
}

impl JsonlSink {
    /// Open (or create) the underlying log file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditLogError> {
        Ok(Self {
            log: Mutex::new(AuditLog::open(path)?),
        })
    }
}

impl AuditSink for JsonlSink {
    fn emit(&self, event: &AuditEvent) {
        let mut log = match self.log.lock() {
            Ok(log) => log,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = log.append(event) {
            warn!(
                path = %log.path().display(),
                event_id = %event.event_id,
                error = %e,
                "dropping audit event, append failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AuditOutcome;
    use tempfile::tempdir;

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&AuditEvent::new("ap_a", "p1", AuditOutcome::Allowed))
                .unwrap();
            log.append(&AuditEvent::new("ap_a", "p2", AuditOutcome::DeniedPolicy))
                .unwrap();
        }

        let events = AuditLog::read_all(&log_path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].policy_id, "p1");
        assert_eq!(events[1].outcome, AuditOutcome::DeniedPolicy);
    }

    #[test]
    fn reopen_appends_instead_of_truncating() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&AuditEvent::new("ap_a", "p1", AuditOutcome::Allowed))
                .unwrap();
        }
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&AuditEvent::new("ap_a", "p2", AuditOutcome::DeniedLocal))
                .unwrap();
        }

        assert_eq!(AuditLog::read_all(&log_path).unwrap().len(), 2);
    }

    #[test]
    fn jsonl_sink_emits_through_the_trait() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");

        let sink = JsonlSink::open(&log_path).unwrap();
        sink.emit(&AuditEvent::new(
            "ap_a",
            "p1",
            AuditOutcome::VerificationFailed,
        ));

        let events = AuditLog::read_all(&log_path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::VerificationFailed);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = AuditLog::read_all("/nonexistent/audit.jsonl").unwrap_err();
        assert!(matches!(err, AuditLogError::OpenFailed { .. }));
    }
}
