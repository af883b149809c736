//! Append-only audit trail of mutating operations.
//!
//! One line per event: `[19 Januari 2026 21.15.31] Reshuffle triggered. ...`

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::timestamp::{GenerationId, TimestampCodec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    Reshuffle { archived: Option<GenerationId> },
    Restore { restored: GenerationId, archived: Option<GenerationId> },
}

impl AuditEvent {
    pub fn describe(&self) -> String {
        match self {
            AuditEvent::Reshuffle { archived: Some(id) } => format!(
                "Reshuffle triggered. Previous arrangement archived as {}",
                id.file_name()
            ),
            AuditEvent::Reshuffle { archived: None } => {
                "Reshuffle triggered. First arrangement saved".to_string()
            }
            AuditEvent::Restore { restored, archived: Some(id) } => format!(
                "Restored {}. Previous arrangement archived as {}",
                restored.file_name(),
                id.file_name()
            ),
            AuditEvent::Restore { restored, archived: None } => {
                format!("Restored {}", restored.file_name())
            }
        }
    }
}

pub enum AuditSink {
    File(PathBuf),
    Memory(Mutex<Vec<String>>),
    Disabled,
}

pub struct AuditLog {
    sink: AuditSink,
    codec: TimestampCodec,
}

impl AuditLog {
    pub fn file(path: impl AsRef<Path>, codec: TimestampCodec) -> Self {
        AuditLog {
            sink: AuditSink::File(path.as_ref().to_path_buf()),
            codec,
        }
    }

    pub fn memory(codec: TimestampCodec) -> Self {
        AuditLog {
            sink: AuditSink::Memory(Mutex::new(Vec::new())),
            codec,
        }
    }

    pub fn disabled() -> Self {
        AuditLog {
            sink: AuditSink::Disabled,
            codec: TimestampCodec::default(),
        }
    }

    pub fn line(&self, at: DateTime<Utc>, event: &AuditEvent) -> String {
        format!("[{}] {}", self.codec.display_instant(at), event.describe())
    }

    pub fn append(&self, at: DateTime<Utc>, event: &AuditEvent) -> std::io::Result<()> {
        let line = self.line(at, event);
        match &self.sink {
            AuditSink::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{line}")
            }
            AuditSink::Memory(lines) => {
                lines
                    .lock()
                    .map_err(|_| std::io::Error::other("audit buffer poisoned"))?
                    .push(line);
                Ok(())
            }
            AuditSink::Disabled => Ok(()),
        }
    }

    /// Lines recorded by a memory sink; empty for the other sinks.
    pub fn recorded(&self) -> Vec<String> {
        match &self.sink {
            AuditSink::Memory(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
            AuditSink::File(_) | AuditSink::Disabled => Vec::new(),
        }
    }
}
