//! Snapshot storage.
//!
//! One current arrangement plus an append-only archive keyed by
//! generation id. Three backends share the [`Backend`] trait:
//! - memory: maps behind a lock, used by tests
//! - directory: `current.json` and `archive/config-<id>.json`
//! - sqlite: one database file, rotation in a single transaction
//!
//! [`SnapshotStore`] serializes every save and restore behind one mutex,
//! plus the backend's [`WriterLock`] across processes, so two writers can
//! never archive the same old current twice.

pub mod dir;
pub mod lock;
pub mod memory;
pub mod sqlite;

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::audit::{AuditEvent, AuditLog};
use crate::error::StoreError;
use crate::pairing::Arrangement;
use crate::timestamp::{Decoded, GenerationId, TimestampCodec};

pub use dir::DirBackend;
pub use lock::WriterLock;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Key-ordered persistence for the current slot and the archive.
///
/// `put` must refuse to overwrite an existing archive entry.
pub trait Backend: Send + Sync {
    fn put(&self, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError>;

    fn get(&self, id: &GenerationId) -> Result<Option<Arrangement>, StoreError>;

    /// Archive ids in no particular order.
    fn keys(&self) -> Result<Vec<GenerationId>, StoreError>;

    fn current(&self) -> Result<Option<Arrangement>, StoreError>;

    fn set_current(&self, arrangement: &Arrangement) -> Result<(), StoreError>;

    /// Excludes writers in other processes until the returned lock drops.
    fn lock_writers(&self) -> Result<WriterLock, StoreError> {
        Ok(WriterLock::in_process())
    }

    /// Archives the old current (if any) and then replaces it. If archiving
    /// fails the current slot is left untouched.
    fn rotate(
        &self,
        archive: Option<(&GenerationId, &Arrangement)>,
        next: &Arrangement,
    ) -> Result<(), StoreError> {
        if let Some((id, old)) = archive {
            self.put(id, old)?;
        }
        self.set_current(next)
    }

    fn keys_descending(&self, codec: &TimestampCodec) -> Result<Vec<GenerationId>, StoreError> {
        let mut keys = self.keys()?;
        keys.sort_by(|a, b| codec.compare_desc(a.as_str(), b.as_str()));
        Ok(keys)
    }
}

impl<T: Backend + ?Sized> Backend for Box<T> {
    fn put(&self, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError> {
        (**self).put(id, arrangement)
    }

    fn get(&self, id: &GenerationId) -> Result<Option<Arrangement>, StoreError> {
        (**self).get(id)
    }

    fn keys(&self) -> Result<Vec<GenerationId>, StoreError> {
        (**self).keys()
    }

    fn current(&self) -> Result<Option<Arrangement>, StoreError> {
        (**self).current()
    }

    fn set_current(&self, arrangement: &Arrangement) -> Result<(), StoreError> {
        (**self).set_current(arrangement)
    }

    fn lock_writers(&self) -> Result<WriterLock, StoreError> {
        (**self).lock_writers()
    }

    fn rotate(
        &self,
        archive: Option<(&GenerationId, &Arrangement)>,
        next: &Arrangement,
    ) -> Result<(), StoreError> {
        (**self).rotate(archive, next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub id: GenerationId,
    pub decoded: Decoded,
}

/// Result of a save or restore. The data change has happened even when
/// `audit_failure` is set.
#[derive(Debug)]
pub struct Mutation {
    pub archived_as: Option<GenerationId>,
    pub audit_failure: Option<StoreError>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct SnapshotStore<B> {
    backend: B,
    codec: TimestampCodec,
    audit: AuditLog,
    writer: Mutex<()>,
    clock: Clock,
}

impl<B: Backend> SnapshotStore<B> {
    pub fn new(backend: B, codec: TimestampCodec, audit: AuditLog) -> Self {
        SnapshotStore {
            backend,
            codec,
            audit,
            writer: Mutex::new(()),
            clock: Box::new(Utc::now),
        }
    }

    /// Replaces the wall clock used for minting ids and audit lines.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn codec(&self) -> &TimestampCodec {
        &self.codec
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Makes `arrangement` current, archiving the previous current first.
    pub fn save_as_current(&self, arrangement: &Arrangement) -> Result<Mutation, StoreError> {
        let _guard = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        let _lock = self.backend.lock_writers()?;
        let now = (self.clock)();

        let archived_as = self.rotate_into(now, arrangement)?;
        tracing::info!(archived = ?archived_as.as_ref().map(GenerationId::as_str), "saved new current arrangement");

        let audit_failure = self.record(now, &AuditEvent::Reshuffle {
            archived: archived_as.clone(),
        });

        Ok(Mutation { archived_as, audit_failure })
    }

    /// Copies the archived arrangement `id` into the current slot. The
    /// archive entry itself stays where it is.
    pub fn restore(&self, id: &GenerationId) -> Result<Mutation, StoreError> {
        let _guard = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        let _lock = self.backend.lock_writers()?;

        let target = self
            .backend
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let now = (self.clock)();
        let archived_as = self.rotate_into(now, &target)?;
        tracing::info!(restored = %id, archived = ?archived_as.as_ref().map(GenerationId::as_str), "restored arrangement");

        let audit_failure = self.record(now, &AuditEvent::Restore {
            restored: id.clone(),
            archived: archived_as.clone(),
        });

        Ok(Mutation { archived_as, audit_failure })
    }

    /// The current arrangement, or the newest archive entry when no current
    /// has been written yet.
    pub fn read_current(&self) -> Result<Option<Arrangement>, StoreError> {
        if let Some(current) = self.backend.current()? {
            return Ok(Some(current));
        }

        match self.backend.keys_descending(&self.codec)?.first() {
            Some(latest) => {
                tracing::debug!(id = %latest, "no current slot, falling back to newest archive entry");
                self.backend.get(latest)
            }
            None => Ok(None),
        }
    }

    /// Archive entries, newest first. Ids in no known format sort last.
    pub fn list_history(&self) -> Result<Vec<ArchiveEntry>, StoreError> {
        let entries = self
            .backend
            .keys_descending(&self.codec)?
            .into_iter()
            .map(|id| {
                let decoded = self.codec.decode(id.as_str());
                if !decoded.is_recognized() {
                    tracing::warn!(id = %id, "archive id matches no known timestamp format");
                }
                ArchiveEntry { id, decoded }
            })
            .collect();
        Ok(entries)
    }

    pub fn read_by_id(&self, id: &GenerationId) -> Result<Arrangement, StoreError> {
        self.backend
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // caller holds the writer mutex and the backend lock
    fn rotate_into(&self, now: DateTime<Utc>, next: &Arrangement) -> Result<Option<GenerationId>, StoreError> {
        let old = self.backend.current()?;

        let archived_as = match old {
            Some(_) => Some(self.next_id(now)?),
            None => None,
        };

        self.backend
            .rotate(archived_as.as_ref().zip(old.as_ref()), next)?;

        Ok(archived_as)
    }

    fn next_id(&self, now: DateTime<Utc>) -> Result<GenerationId, StoreError> {
        let latest = self
            .backend
            .keys()?
            .iter()
            .filter_map(|id| self.codec.decode(id.as_str()).instant)
            .max();
        Ok(self.codec.mint_after(now, latest))
    }

    fn record(&self, at: DateTime<Utc>, event: &AuditEvent) -> Option<StoreError> {
        match self.audit.append(at, event) {
            Ok(()) => None,
            Err(source) => {
                tracing::warn!(error = %source, "failed to append audit line");
                Some(StoreError::Audit { source })
            }
        }
    }
}
