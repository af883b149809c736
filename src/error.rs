//! Error taxonomy.
//!
//! Roster problems are rejected before pairing runs, storage problems carry
//! the operation and id they happened on so a caller can retry. Unpaired
//! people and undecodable ids are not errors; see [`crate::pairing`] and
//! [`crate::service::HistoryEntry`].

use std::path::PathBuf;

/// Bad roster input. Nothing is mutated when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster is empty")]
    EmptyRoster,

    #[error("line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("line {line}: unknown category code '{code}' (expected L or P)")]
    UnknownCategory { line: usize, code: String },

    #[error("line {line}: name is empty")]
    EmptyName { line: usize },

    #[error("failed to read roster {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Snapshot storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot '{0}' not found")]
    NotFound(String),

    #[error("{op} failed for '{id}': {source}")]
    Io {
        op: &'static str,
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} failed for '{id}': invalid snapshot json: {source}")]
    Json {
        op: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{op} failed for '{id}': {source}")]
    Sqlite {
        op: &'static str,
        id: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("audit log append failed: {source}")]
    Audit {
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(op: &'static str, id: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io { op, id: id.into(), source }
    }

    pub(crate) fn json(op: &'static str, id: impl Into<String>, source: serde_json::Error) -> Self {
        StoreError::Json { op, id: id.into(), source }
    }

    pub(crate) fn sqlite(op: &'static str, id: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let id = id.into();
        move |source| StoreError::Sqlite { op, id, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors returned by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum SeatingError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
