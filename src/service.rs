//! Commands offered to any front end: generate-and-save, get-current,
//! list-history, get-by-id and restore.
//!
//! Everything returns a typed result. "No arrangement yet" is `Ok(None)`
//! from [`Service::get_current`], not an error.

use rand::Rng;
use serde::Serialize;

use crate::audit::AuditLog;
use crate::config::{BackendKind, Config};
use crate::error::{SeatingError, StoreError};
use crate::layout::{self, Layout};
use crate::pairing::{Arrangement, PairingEngine, UnpairedPerson};
use crate::roster::RosterProvider;
use crate::store::{Backend, DirBackend, SnapshotStore, SqliteBackend};
use crate::timestamp::{GenerationId, TimestampCodec};

/// An arrangement together with its grid.
#[derive(Debug, Clone, Serialize)]
pub struct Seating {
    pub arrangement: Arrangement,
    pub layout: Layout,
}

impl Seating {
    pub fn new(arrangement: Arrangement) -> Self {
        let layout = layout::plan(&arrangement);
        Seating { arrangement, layout }
    }
}

#[derive(Debug, Serialize)]
pub struct Generated {
    pub seating: Seating,
    pub unpaired: Vec<UnpairedPerson>,
    pub archived_as: Option<String>,
    #[serde(skip)]
    pub audit_failure: Option<StoreError>,
}

#[derive(Debug, Serialize)]
pub struct Restored {
    pub restored: String,
    pub archived_as: Option<String>,
    #[serde(skip)]
    pub audit_failure: Option<StoreError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub timestamp: String,
    pub display: String,
    /// False when the id matched none of the known timestamp formats.
    pub recognized: bool,
}

pub struct Service<B> {
    store: SnapshotStore<B>,
    engine: PairingEngine,
}

impl<B: Backend> Service<B> {
    pub fn new(store: SnapshotStore<B>, engine: PairingEngine) -> Self {
        Service { store, engine }
    }

    pub fn store(&self) -> &SnapshotStore<B> {
        &self.store
    }

    pub fn generate_and_save<R: Rng + ?Sized>(
        &self,
        roster: &dyn RosterProvider,
        rng: &mut R,
    ) -> Result<Generated, SeatingError> {
        let people = roster.people()?;
        let pairing = self.engine.generate(&people, rng);
        let mutation = self.store.save_as_current(&pairing.arrangement)?;

        Ok(Generated {
            seating: Seating::new(pairing.arrangement),
            unpaired: pairing.unpaired,
            archived_as: mutation.archived_as.map(|id| id.file_name()),
            audit_failure: mutation.audit_failure,
        })
    }

    pub fn get_current(&self) -> Result<Option<Seating>, SeatingError> {
        Ok(self.store.read_current()?.map(Seating::new))
    }

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>, SeatingError> {
        let codec = self.store.codec();
        let entries = self
            .store
            .list_history()?
            .into_iter()
            .map(|entry| HistoryEntry {
                filename: entry.id.file_name(),
                display: codec.display(entry.id.as_str()),
                timestamp: entry.id.to_string(),
                recognized: entry.decoded.is_recognized(),
            })
            .collect();
        Ok(entries)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Seating, SeatingError> {
        let id = parse_id(id)?;
        Ok(Seating::new(self.store.read_by_id(&id)?))
    }

    pub fn restore(&self, id: &str) -> Result<Restored, SeatingError> {
        let id = parse_id(id)?;
        let mutation = self.store.restore(&id)?;
        Ok(Restored {
            restored: id.file_name(),
            archived_as: mutation.archived_as.map(|id| id.file_name()),
            audit_failure: mutation.audit_failure,
        })
    }
}

fn parse_id(raw: &str) -> Result<GenerationId, StoreError> {
    GenerationId::parse(raw).ok_or_else(|| StoreError::NotFound(raw.to_string()))
}

/// Opens the backend and audit log named by `config`.
pub fn open(config: &Config) -> Result<Service<Box<dyn Backend>>, StoreError> {
    let backend: Box<dyn Backend> = match config.backend {
        BackendKind::Directory => Box::new(DirBackend::open(&config.data_dir)?),
        BackendKind::Sqlite => Box::new(SqliteBackend::open(config.database_path())?),
    };

    let codec = TimestampCodec::local();
    let audit = AuditLog::file(&config.audit_log, codec);
    let store = SnapshotStore::new(backend, codec, audit);

    Ok(Service::new(store, PairingEngine::new(config.unpaired)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Category, DelimitedRoster, Person, StaticRoster};
    use crate::store::MemoryBackend;
    use chrono::FixedOffset;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn service() -> Service<MemoryBackend> {
        let codec = TimestampCodec::with_offset(FixedOffset::east_opt(0).unwrap());
        let store = SnapshotStore::new(MemoryBackend::new(), codec, AuditLog::memory(codec));
        Service::new(store, PairingEngine::default())
    }

    fn roster() -> StaticRoster {
        StaticRoster::new(vec![
            Person::new("ARI", Category::Male),
            Person::new("NABIL", Category::Male),
            Person::new("NOVAL", Category::Male),
            Person::new("NURUL", Category::Female),
            Person::new("ADILAH", Category::Female),
        ])
    }

    #[test]
    fn generate_reports_unpaired_and_saves() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(5);
        let generated = service.generate_and_save(&roster(), &mut rng).unwrap();

        assert_eq!(generated.seating.arrangement.len(), 2);
        assert_eq!(generated.unpaired.len(), 1);
        assert_eq!(generated.unpaired[0].category, Category::Male);
        assert!(generated.archived_as.is_none());

        let current = service.get_current().unwrap().unwrap();
        assert_eq!(current.arrangement, generated.seating.arrangement);
        assert_eq!(current.layout.placeholders(), 2);
    }

    #[test]
    fn bad_roster_mutates_nothing() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(5);
        let err = service
            .generate_and_save(&DelimitedRoster::from_text("A,Z\n", ','), &mut rng)
            .unwrap_err();

        assert!(matches!(err, SeatingError::Roster(_)));
        assert!(service.get_current().unwrap().is_none());
        assert!(service.store().audit().recorded().is_empty());
    }

    #[test]
    fn current_absent_is_not_an_error() {
        assert!(service().get_current().unwrap().is_none());
        assert!(service().list_history().unwrap().is_empty());
    }

    #[test]
    fn history_and_restore_by_file_name() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(1);
        let first = service.generate_and_save(&roster(), &mut rng).unwrap();
        let second = service.generate_and_save(&roster(), &mut rng).unwrap();

        let history = service.list_history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].recognized);
        assert_eq!(Some(history[0].filename.clone()), second.archived_as);

        let viewed = service.get_by_id(&history[0].filename).unwrap();
        assert_eq!(viewed.arrangement, first.seating.arrangement);

        let restored = service.restore(&history[0].timestamp).unwrap();
        assert!(restored.archived_as.is_some());
        let current = service.get_current().unwrap().unwrap();
        assert_eq!(current.arrangement, first.seating.arrangement);
    }

    #[test]
    fn unknown_or_unsafe_ids_are_not_found() {
        let service = service();
        for raw in ["01-01-2020_00-00-00", "../current", ""] {
            let err = service.restore(raw).unwrap_err();
            assert!(matches!(err, SeatingError::Store(StoreError::NotFound(_))), "{raw}");
            assert!(matches!(service.get_by_id(raw), Err(SeatingError::Store(StoreError::NotFound(_)))));
        }
    }
}
