use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Backend;
use crate::error::StoreError;
use crate::pairing::Arrangement;
use crate::timestamp::GenerationId;

#[derive(Default)]
struct State {
    current: Option<Arrangement>,
    archive: BTreeMap<GenerationId, Arrangement>,
}

/// Keeps everything in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

fn insert_new(state: &mut State, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError> {
    if state.archive.contains_key(id) {
        return Err(StoreError::io(
            "archive",
            id.as_str(),
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }
    state.archive.insert(id.clone(), arrangement.clone());
    Ok(())
}

impl Backend for MemoryBackend {
    fn put(&self, id: &GenerationId, arrangement: &Arrangement) -> Result<(), StoreError> {
        let mut state = self.write()?;
        insert_new(&mut state, id, arrangement)
    }

    fn get(&self, id: &GenerationId) -> Result<Option<Arrangement>, StoreError> {
        Ok(self.read()?.archive.get(id).cloned())
    }

    fn keys(&self) -> Result<Vec<GenerationId>, StoreError> {
        Ok(self.read()?.archive.keys().cloned().collect())
    }

    fn current(&self) -> Result<Option<Arrangement>, StoreError> {
        Ok(self.read()?.current.clone())
    }

    fn set_current(&self, arrangement: &Arrangement) -> Result<(), StoreError> {
        self.write()?.current = Some(arrangement.clone());
        Ok(())
    }

    fn rotate(
        &self,
        archive: Option<(&GenerationId, &Arrangement)>,
        next: &Arrangement,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if let Some((id, old)) = archive {
            insert_new(&mut state, id, old)?;
        }
        state.current = Some(next.clone());
        Ok(())
    }
}
