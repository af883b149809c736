//! Directory backend.
//!
//! ```text
//! <root>/current.json
//! <root>/archive/config-<id>.json
//! <root>/.lock
//! ```
//!
//! Every file is written to a temp file in the destination directory and
//! renamed into place, so readers see either the previous or the new
//! content and never a partial file.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{Backend, WriterLock};
use crate::error::StoreError;
use crate::pairing::Arrangement;
use crate::timestamp::GenerationId;

const CURRENT_FILE: &str = "current.json";
const ARCHIVE_DIR: &str = "archive";
const LOCK_FILE: &str = ".lock";

pub struct DirBackend {
    root: PathBuf,
}

impl DirBackend {
    /// Creates the directory layout under `root` if it is missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let archive = root.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive)
            .map_err(|e| StoreError::io("open", archive.display().to_string(), e))?;
        Ok(DirBackend { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    fn archive_path(&self, id: &GenerationId) -> PathBuf {
        self.archive_dir().join(id.file_name())
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }
}

fn read_json(path: &Path, op: &'static str, id: &str) -> Result<Option<Arrangement>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(op, id, e)),
    };
    tracing::debug!(path = %path.display(), "read snapshot file");
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::json(op, id, e))
}

// noclobber: refuse to replace an existing file
fn write_json(
    path: &Path,
    arrangement: &Arrangement,
    op: &'static str,
    id: &str,
    noclobber: bool,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(op, id, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, arrangement).map_err(|e| StoreError::json(op, id, e))?;
        writer.flush().map_err(|e| StoreError::io(op, id, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| StoreError::io(op, id, e))?;

    let persisted = if noclobber {
        tmp.persist_noclobber(path)
    } else {
        tmp.persist(path)
    };
    persisted.map_err(|e| StoreError::io(op, id, e.error))?;

    tracing::debug!(path = %path.display(), "wrote snapshot file");
    Ok(())
}

impl Backend for DirBackend {
    fn put(&self, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError> {
        write_json(&self.archive_path(id), arrangement, "archive", id.as_str(), true)
    }

    fn get(&self, id: &GenerationId) -> Result<Option<Arrangement>, StoreError> {
        read_json(&self.archive_path(id), "read archive", id.as_str())
    }

    fn keys(&self) -> Result<Vec<GenerationId>, StoreError> {
        let dir = self.archive_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("list archive", dir.display().to_string(), e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("list archive", dir.display().to_string(), e))?;
            let name = entry.file_name();
            // temp files and anything else not shaped like config-<id>.json
            if let Some(id) = name.to_str().and_then(GenerationId::from_file_name) {
                keys.push(id);
            }
        }
        Ok(keys)
    }

    fn current(&self) -> Result<Option<Arrangement>, StoreError> {
        read_json(&self.current_path(), "read current", CURRENT_FILE)
    }

    fn set_current(&self, arrangement: &Arrangement) -> Result<(), StoreError> {
        write_json(&self.current_path(), arrangement, "write current", CURRENT_FILE, false)
    }

    fn lock_writers(&self) -> Result<WriterLock, StoreError> {
        WriterLock::acquire(&self.root.join(LOCK_FILE))
    }
}
