use super::backend::EntryBackend;
use crate::core::errors::{Error, Result};
use crate::models::entry::{Entry, EntryId, EntryType};
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    entries: HashMap<EntryId, Entry>,
    by_parent: HashMap<Option<EntryId>, BTreeSet<EntryId>>,
    by_type: HashMap<EntryType, BTreeSet<EntryId>>,
}

impl Tables {
    fn unlink(&mut self, entry: &Entry) {
        if let Some(children) = self.by_parent.get_mut(&entry.parent_id) {
            children.remove(&entry.id);
            if children.is_empty() {
                self.by_parent.remove(&entry.parent_id);
            }
        }
        if let Some(ids) = self.by_type.get_mut(&entry.entry_type()) {
            ids.remove(&entry.id);
        }
    }

    fn link(&mut self, entry: &Entry) {
        self.by_parent
            .entry(entry.parent_id.clone())
            .or_default()
            .insert(entry.id.clone());
        self.by_type
            .entry(entry.entry_type())
            .or_default()
            .insert(entry.id.clone());
    }
}

/// In-process backend with the same contract as the sled one. Nothing is
/// persisted beyond the lifetime of the value.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Unknown("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Unknown("memory store lock poisoned".to_string()))
    }
}

impl EntryBackend for MemoryBackend {
    fn get_all(&self) -> Result<Vec<Entry>> {
        Ok(self.read()?.entries.values().cloned().collect())
    }

    fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>> {
        Ok(self.read()?.entries.get(id).cloned())
    }

    fn get_by_parent(&self, parent_id: Option<&EntryId>) -> Result<Vec<Entry>> {
        let tables = self.read()?;
        let Some(children) = tables.by_parent.get(&parent_id.cloned()) else {
            return Ok(Vec::new());
        };
        Ok(children
            .iter()
            .filter_map(|id| tables.entries.get(id).cloned())
            .collect())
    }

    fn get_by_type(&self, entry_type: EntryType) -> Result<Vec<Entry>> {
        let tables = self.read()?;
        let Some(ids) = tables.by_type.get(&entry_type) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| tables.entries.get(id).cloned())
            .collect())
    }

    fn add(&self, entry: &Entry) -> Result<()> {
        let mut tables = self.write()?;
        if tables.entries.contains_key(&entry.id) {
            return Err(Error::Conflict(entry.id.clone()));
        }
        tables.link(entry);
        tables.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn update(&self, entry: &Entry) -> Result<()> {
        let mut tables = self.write()?;
        if let Some(previous) = tables.entries.remove(&entry.id) {
            tables.unlink(&previous);
        }
        tables.link(entry);
        tables.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, id: &EntryId) -> Result<()> {
        let mut tables = self.write()?;
        if let Some(previous) = tables.entries.remove(id) {
            tables.unlink(&previous);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut tables = self.write()?;
        tables.entries.clear();
        tables.by_parent.clear();
        tables.by_type.clear();
        Ok(())
    }
}
