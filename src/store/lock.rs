//! Cross-process writer lock.
//!
//! Every `seatmate generate` or `restore` is its own process with its own
//! [`super::SnapshotStore`], so the in-process mutex alone cannot keep two
//! of them from archiving the same old current. File-backed stores take an
//! exclusive advisory lock on a sibling lock file for the whole
//! read-mint-rotate-audit sequence.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs4::fs_std::FileExt;

use crate::error::StoreError;

/// Held for the duration of one save or restore. Dropping it closes the
/// file, which releases the lock.
#[derive(Debug)]
pub struct WriterLock {
    _file: Option<File>,
}

impl WriterLock {
    /// For backends that live in one process and need no file lock.
    pub fn in_process() -> Self {
        WriterLock { _file: None }
    }

    /// Blocks until no other writer holds `path`.
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        let id = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StoreError::io("lock", id.clone(), e))?;

        FileExt::lock_exclusive(&file).map_err(|e| StoreError::io("lock", id, e))?;
        tracing::debug!(path = %path.display(), "acquired writer lock");

        Ok(WriterLock { _file: Some(file) })
    }
}
