//! Persistent entry store.
//!
//! [`EntryStore`] is the async face of a synchronous [`EntryBackend`]. Backend
//! work runs on the blocking pool so callers never stall the runtime.

pub mod backend;
pub mod disk;
pub mod memory;

pub use backend::EntryBackend;
pub use disk::SledBackend;
pub use memory::MemoryBackend;

use crate::core::config::StoreConfig;
use crate::core::errors::{Error, Result};
use crate::models::entry::{Entry, EntryId, EntryType};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task;

struct StoreInner {
    /// `None` when the store wraps a backend opened elsewhere.
    config: Option<StoreConfig>,
    backend: OnceCell<Arc<dyn EntryBackend>>,
}

/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct EntryStore {
    inner: Arc<StoreInner>,
}

impl EntryStore {
    /// Creates a store that opens its backend from `config` on first use.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config: Some(config),
                backend: OnceCell::new(),
            }),
        }
    }

    /// Wraps an already opened backend. Such a store has no config.
    pub fn with_backend(backend: Arc<dyn EntryBackend>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config: None,
                backend: OnceCell::new_with(Some(backend)),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub fn config(&self) -> Option<&StoreConfig> {
        self.inner.config.as_ref()
    }

    /// Opens the backing medium and its schema. Safe to call repeatedly; a
    /// failed attempt leaves the store uninitialized so it can be retried.
    pub async fn initialize(&self) -> Result<()> {
        self.backend().await.map(|_| ())
    }

    async fn backend(&self) -> Result<Arc<dyn EntryBackend>> {
        let backend = self
            .inner
            .backend
            .get_or_try_init(|| async {
                let config = self.inner.config.clone().ok_or_else(|| {
                    Error::StorageUnavailable("store has no backend configuration".to_string())
                })?;
                let opened = task::spawn_blocking(move || open_backend(&config))
                    .await
                    .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
                if let Err(err) = &opened {
                    tracing::error!("failed to open entry store: {}", err);
                }
                opened
            })
            .await?;
        Ok(backend.clone())
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn EntryBackend) -> Result<T> + Send + 'static,
    {
        let backend = self.backend().await?;
        task::spawn_blocking(move || op(backend.as_ref())).await?
    }

    pub async fn get_all(&self) -> Result<Vec<Entry>> {
        self.run(|backend| backend.get_all()).await
    }

    pub async fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>> {
        let id = id.clone();
        self.run(move |backend| backend.get_by_id(&id)).await
    }

    pub async fn get_by_parent(&self, parent_id: Option<&EntryId>) -> Result<Vec<Entry>> {
        let parent_id = parent_id.cloned();
        self.run(move |backend| backend.get_by_parent(parent_id.as_ref()))
            .await
    }

    pub async fn get_by_type(&self, entry_type: EntryType) -> Result<Vec<Entry>> {
        self.run(move |backend| backend.get_by_type(entry_type)).await
    }

    #[tracing::instrument(skip(self, entry), fields(id = %entry.id, name = %entry.name))]
    pub async fn add(&self, entry: Entry) -> Result<()> {
        self.run(move |backend| backend.add(&entry)).await?;
        tracing::debug!("entry added");
        Ok(())
    }

    #[tracing::instrument(skip(self, entry), fields(id = %entry.id))]
    pub async fn update(&self, entry: Entry) -> Result<()> {
        self.run(move |backend| backend.update(&entry)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: &EntryId) -> Result<()> {
        let id = id.clone();
        self.run(move |backend| backend.remove(&id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.run(|backend| backend.clear()).await?;
        tracing::info!("entry store cleared");
        Ok(())
    }
}

fn open_backend(config: &StoreConfig) -> Result<Arc<dyn EntryBackend>> {
    if config.ephemeral {
        tracing::debug!("using in-memory entry store");
        return Ok(Arc::new(MemoryBackend::new()));
    }
    Ok(Arc::new(SledBackend::open(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::FileData;
    use tempfile::TempDir;

    #[tokio::test]
    async fn add_then_get_round_trips() -> Result<()> {
        let store = EntryStore::in_memory();
        let file = Entry::file(
            "file-1".into(),
            "report.pdf",
            None,
            FileData::new(b"%PDF-1.4".to_vec(), "application/pdf"),
        );
        store.add(file.clone()).await?;
        assert_eq!(store.get_by_id(&file.id).await?, Some(file));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_add_is_a_conflict() -> Result<()> {
        let store = EntryStore::in_memory();
        let folder = Entry::folder("folder-1".into(), "A", None);
        store.add(folder.clone()).await?;

        let result = store.add(folder).await;
        assert!(matches!(result, Err(Error::Conflict(id)) if id.as_str() == "folder-1"));
        Ok(())
    }

    #[tokio::test]
    async fn update_inserts_unknown_ids() -> Result<()> {
        let store = EntryStore::in_memory();
        let folder = Entry::folder("folder-1".into(), "A", None);
        store.update(folder.clone()).await?;
        assert_eq!(store.get_by_parent(None).await?, vec![folder]);
        Ok(())
    }

    #[tokio::test]
    async fn removing_a_missing_id_is_a_no_op() -> Result<()> {
        let store = EntryStore::in_memory();
        let missing = EntryId::from("missing-id");
        store.remove(&missing).await?;
        assert!(store.get_by_id(&missing).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_the_store() -> Result<()> {
        let store = EntryStore::in_memory();
        store.add(Entry::folder("a".into(), "A", None)).await?;
        store.add(Entry::folder("b".into(), "B", Some("a".into()))).await?;
        store.clear().await?;
        assert!(store.get_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn wrapped_backend_reports_no_config() -> Result<()> {
        let store = EntryStore::with_backend(Arc::new(SledBackend::temporary()?));
        assert!(store.config().is_none());
        store.initialize().await?;

        let configured = EntryStore::new(StoreConfig::ephemeral());
        assert_eq!(configured.config().map(|c| c.ephemeral), Some(true));
        Ok(())
    }

    #[tokio::test]
    async fn type_lookup_separates_folders_and_files() -> Result<()> {
        let store = EntryStore::in_memory();
        store.add(Entry::folder("a".into(), "A", None)).await?;
        store
            .add(Entry::file(
                "f".into(),
                "x.pdf",
                Some("a".into()),
                FileData::new(vec![1], "application/pdf"),
            ))
            .await?;

        let folders = store.get_by_type(EntryType::Folder).await?;
        assert_eq!(folders.len(), 1);
        assert!(folders[0].is_folder());
        let files = store.get_by_type(EntryType::File).await?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id.as_str(), "f");
        Ok(())
    }

    #[tokio::test]
    async fn initialize_is_idempotent() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let store = EntryStore::new(StoreConfig::new(dir.path().join("db")));
        store.initialize().await?;
        store.add(Entry::folder("a".into(), "A", None)).await?;
        store.initialize().await?;
        assert_eq!(store.get_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unopenable_medium_reports_storage_unavailable() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let store = EntryStore::new(StoreConfig::new(blocker.join("db")));

        let err = store.initialize().await.unwrap_err();
        assert!(err.is_storage_unavailable());
        let err = store.get_all().await.unwrap_err();
        assert!(err.is_storage_unavailable());
        Ok(())
    }
}
