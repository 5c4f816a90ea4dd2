use super::backend::EntryBackend;
use crate::core::config::StoreConfig;
use crate::core::errors::{Error, Result};
use crate::models::entry::{Entry, EntryId, EntryKind, EntryType, FileData, Timestamp};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{IVec, Transactional, Tree};
use std::fs;

const ENTRIES_TREE: &str = "entries";
const PARENT_INDEX_TREE: &str = "by_parent";
const CONTENTS_TREE: &str = "contents";
const TYPE_INDEX_TREE: &str = "by_type";

// Index keys are `<scope>\0<id>`. Root scope and folder scopes never share a
// leading byte.
const ROOT_SCOPE: u8 = b'/';
const FOLDER_SCOPE: u8 = b'#';

/// Metadata persisted in the `entries` tree. File content lives in the
/// `contents` tree under the same key.
#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    id: EntryId,
    name: String,
    parent_id: Option<EntryId>,
    created_at: Timestamp,
    modified_at: Timestamp,
    #[serde(flatten)]
    kind: RecordKind,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RecordKind {
    Folder,
    File { size: u64, mime_type: String },
}

impl RecordKind {
    fn entry_type(&self) -> EntryType {
        match self {
            RecordKind::Folder => EntryType::Folder,
            RecordKind::File { .. } => EntryType::File,
        }
    }
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        let kind = match &entry.kind {
            EntryKind::Folder => RecordKind::Folder,
            EntryKind::File(data) => RecordKind::File {
                size: data.size,
                mime_type: data.mime_type.clone(),
            },
        };
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            parent_id: entry.parent_id.clone(),
            created_at: entry.created_at,
            modified_at: entry.modified_at,
            kind,
        }
    }
}

impl EntryRecord {
    fn into_entry(self, content: Option<IVec>) -> Entry {
        let kind = match self.kind {
            RecordKind::Folder => EntryKind::Folder,
            RecordKind::File { size, mime_type } => EntryKind::File(FileData {
                content: content.map(|bytes| bytes.to_vec()).unwrap_or_default(),
                size,
                mime_type,
            }),
        };
        Entry {
            id: self.id,
            name: self.name,
            kind,
            parent_id: self.parent_id,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }
}

fn scope_prefix(parent_id: Option<&EntryId>) -> Vec<u8> {
    let mut key = match parent_id {
        None => vec![ROOT_SCOPE],
        Some(id) => {
            let mut key = Vec::with_capacity(id.as_str().len() + 2);
            key.push(FOLDER_SCOPE);
            key.extend_from_slice(id.as_str().as_bytes());
            key
        }
    };
    key.push(0);
    key
}

fn index_key(parent_id: Option<&EntryId>, id: &EntryId) -> Vec<u8> {
    let mut key = scope_prefix(parent_id);
    key.extend_from_slice(id.as_str().as_bytes());
    key
}

fn type_prefix(entry_type: EntryType) -> Vec<u8> {
    let mut key = entry_type.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

fn type_key(entry_type: EntryType, id: &EntryId) -> Vec<u8> {
    let mut key = type_prefix(entry_type);
    key.extend_from_slice(id.as_str().as_bytes());
    key
}

fn decode(raw: &[u8]) -> std::result::Result<EntryRecord, ConflictableTransactionError<Error>> {
    serde_json::from_slice(raw).map_err(|e| ConflictableTransactionError::Abort(Error::from(e)))
}

fn from_transaction(err: TransactionError<Error>) -> Error {
    match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => err.into(),
    }
}

fn unavailable(err: impl std::fmt::Display) -> Error {
    Error::StorageUnavailable(err.to_string())
}

/// Durable backend on top of an embedded `sled` database.
pub struct SledBackend {
    db: sled::Db,
    entries: Tree,
    by_parent: Tree,
    contents: Tree,
    by_type: Tree,
    flush_on_write: bool,
}

impl SledBackend {
    /// Opens (or creates) the database under `config.data_dir`. Opening an
    /// existing database leaves its trees untouched.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            Error::StorageUnavailable(format!(
                "cannot create data dir '{}': {e}",
                config.data_dir.display()
            ))
        })?;
        let db = sled::Config::new()
            .path(&config.data_dir)
            .open()
            .map_err(unavailable)?;
        tracing::info!(path = %config.data_dir.display(), "opened entry database");
        Self::from_db(db, config.flush_on_write)
    }

    /// A throwaway database removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(unavailable)?;
        Self::from_db(db, false)
    }

    fn from_db(db: sled::Db, flush_on_write: bool) -> Result<Self> {
        let entries = db.open_tree(ENTRIES_TREE).map_err(unavailable)?;
        let by_parent = db.open_tree(PARENT_INDEX_TREE).map_err(unavailable)?;
        let contents = db.open_tree(CONTENTS_TREE).map_err(unavailable)?;
        let by_type = db.open_tree(TYPE_INDEX_TREE).map_err(unavailable)?;
        Ok(Self {
            db,
            entries,
            by_parent,
            contents,
            by_type,
            flush_on_write,
        })
    }

    fn load(&self, raw: &[u8]) -> Result<Entry> {
        let record: EntryRecord = serde_json::from_slice(raw)?;
        let content = match record.kind {
            RecordKind::File { .. } => self.contents.get(record.id.as_str().as_bytes())?,
            RecordKind::Folder => None,
        };
        Ok(record.into_entry(content))
    }

    fn flush(&self) -> Result<()> {
        if self.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }
}

impl EntryBackend for SledBackend {
    fn get_all(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for item in self.entries.iter() {
            let (_, raw) = item?;
            entries.push(self.load(&raw)?);
        }
        Ok(entries)
    }

    fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>> {
        match self.entries.get(id.as_str().as_bytes())? {
            Some(raw) => Ok(Some(self.load(&raw)?)),
            None => Ok(None),
        }
    }

    fn get_by_parent(&self, parent_id: Option<&EntryId>) -> Result<Vec<Entry>> {
        let mut children = Vec::new();
        for item in self.by_parent.scan_prefix(scope_prefix(parent_id)) {
            let (_, id_key) = item?;
            let Some(raw) = self.entries.get(&id_key)? else {
                tracing::warn!(
                    id = %String::from_utf8_lossy(&id_key),
                    "parent index points at a missing entry"
                );
                continue;
            };
            let entry = self.load(&raw)?;
            // Ids are opaque, so a prefix can in principle match a longer scope.
            if entry.parent_id.as_ref() == parent_id {
                children.push(entry);
            }
        }
        Ok(children)
    }

    fn get_by_type(&self, entry_type: EntryType) -> Result<Vec<Entry>> {
        let mut matches = Vec::new();
        for item in self.by_type.scan_prefix(type_prefix(entry_type)) {
            let (_, id_key) = item?;
            let Some(raw) = self.entries.get(&id_key)? else {
                continue;
            };
            let entry = self.load(&raw)?;
            if entry.entry_type() == entry_type {
                matches.push(entry);
            }
        }
        Ok(matches)
    }

    fn add(&self, entry: &Entry) -> Result<()> {
        let record = serde_json::to_vec(&EntryRecord::from(entry))?;
        let id_key = entry.id.as_str().as_bytes();
        let parent_row = index_key(entry.parent_id.as_ref(), &entry.id);
        let type_row = type_key(entry.entry_type(), &entry.id);

        (&self.entries, &self.by_parent, &self.contents, &self.by_type)
            .transaction(|(entries, by_parent, contents, by_type)| {
                if entries.get(id_key)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(Error::Conflict(
                        entry.id.clone(),
                    )));
                }
                entries.insert(id_key, record.as_slice())?;
                by_parent.insert(parent_row.as_slice(), id_key)?;
                by_type.insert(type_row.as_slice(), id_key)?;
                if let Some(data) = entry.file_data() {
                    contents.insert(id_key, data.content.as_slice())?;
                }
                Ok(())
            })
            .map_err(from_transaction)?;
        self.flush()
    }

    fn update(&self, entry: &Entry) -> Result<()> {
        let record = serde_json::to_vec(&EntryRecord::from(entry))?;
        let id_key = entry.id.as_str().as_bytes();
        let parent_row = index_key(entry.parent_id.as_ref(), &entry.id);
        let type_row = type_key(entry.entry_type(), &entry.id);

        (&self.entries, &self.by_parent, &self.contents, &self.by_type)
            .transaction(|(entries, by_parent, contents, by_type)| {
                if let Some(previous) = entries.get(id_key)? {
                    let previous = decode(&previous)?;
                    if previous.parent_id != entry.parent_id {
                        by_parent.remove(index_key(previous.parent_id.as_ref(), &entry.id))?;
                    }
                    if previous.kind.entry_type() != entry.entry_type() {
                        by_type.remove(type_key(previous.kind.entry_type(), &entry.id))?;
                    }
                }
                entries.insert(id_key, record.as_slice())?;
                by_parent.insert(parent_row.as_slice(), id_key)?;
                by_type.insert(type_row.as_slice(), id_key)?;
                match entry.file_data() {
                    Some(data) => {
                        contents.insert(id_key, data.content.as_slice())?;
                    }
                    None => {
                        contents.remove(id_key)?;
                    }
                }
                Ok(())
            })
            .map_err(from_transaction)?;
        self.flush()
    }

    fn remove(&self, id: &EntryId) -> Result<()> {
        let id_key = id.as_str().as_bytes();
        let removed = (&self.entries, &self.by_parent, &self.contents, &self.by_type)
            .transaction(|(entries, by_parent, contents, by_type)| {
                let Some(previous) = entries.remove(id_key)? else {
                    return Ok(false);
                };
                let previous = decode(&previous)?;
                by_parent.remove(index_key(previous.parent_id.as_ref(), id))?;
                by_type.remove(type_key(previous.kind.entry_type(), id))?;
                contents.remove(id_key)?;
                Ok(true)
            })
            .map_err(from_transaction)?;
        if removed {
            self.flush()?;
        }
        Ok(())
    }

    /// Removes every row of every tree in one transaction, so an interrupted
    /// clear never leaves index rows behind without their entries.
    fn clear(&self) -> Result<()> {
        let mut keys = Vec::with_capacity(4);
        for tree in [&self.entries, &self.by_parent, &self.contents, &self.by_type] {
            let tree_keys = tree.iter().keys().collect::<sled::Result<Vec<IVec>>>()?;
            keys.push(tree_keys);
        }

        (&self.entries, &self.by_parent, &self.contents, &self.by_type)
            .transaction(|(entries, by_parent, contents, by_type)| {
                for (tree, tree_keys) in [entries, by_parent, contents, by_type]
                    .into_iter()
                    .zip(&keys)
                {
                    for key in tree_keys {
                        tree.remove(key.clone())?;
                    }
                }
                Ok::<_, ConflictableTransactionError<Error>>(())
            })
            .map_err(from_transaction)?;
        self.flush()
    }
}
