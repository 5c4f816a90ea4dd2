//! Intent layer over the entry store.
//!
//! [`FileSystem`] sequences the navigator, name resolver and delete engine so
//! that mutations keep the tree invariants. Anything that changes the shape of
//! the tree (moves, deletes) holds the structure lock exclusively; creates and
//! renames share it and serialize per parent scope instead.

pub mod folders;
pub mod listing;
pub mod locks;

use crate::core::config::StoreConfig;
use crate::core::errors::{Error, Result};
use crate::models::entry::{Entry, EntryId, EntryKind, EntryType, FileData};
use crate::services::store::EntryStore;
use crate::services::tree::{Crumb, DeleteEngine, NameResolver, Navigator};
use folders::{build_folder_tree, FolderNode};
use listing::{sort_entries, SortKey};
use locks::ScopeLocks;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct FileSystem {
    store: EntryStore,
    navigator: Navigator,
    names: NameResolver,
    deleter: DeleteEngine,
    structure: Arc<RwLock<()>>,
    locks: Arc<ScopeLocks>,
}

impl FileSystem {
    pub fn new(store: EntryStore) -> Self {
        let navigator = Navigator::new(store.clone());
        Self {
            names: NameResolver::new(navigator.clone()),
            deleter: DeleteEngine::new(store.clone(), navigator.clone()),
            navigator,
            store,
            structure: Arc::new(RwLock::new(())),
            locks: Arc::new(ScopeLocks::new()),
        }
    }

    /// Opens the store described by `config` and initializes it.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let store = EntryStore::new(config);
        store.initialize().await?;
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub async fn get(&self, id: &EntryId) -> Result<Entry> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_folder(&self, parent_id: Option<&EntryId>, name: &str) -> Result<Entry> {
        validate_name(name)?;
        let _shared = self.structure.read().await;
        let _guard = self.locks.lock(parent_id).await;
        self.require_folder(parent_id).await?;

        let name = self.names.resolve_unique_name(name, parent_id, None).await?;
        let folder = Entry::folder(new_id("folder"), name, parent_id.cloned());
        self.store.add(folder.clone()).await?;
        tracing::info!(id = %folder.id, name = %folder.name, "folder created");
        Ok(folder)
    }

    #[tracing::instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_file(
        &self,
        parent_id: Option<&EntryId>,
        name: &str,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<Entry> {
        validate_name(name)?;
        let _shared = self.structure.read().await;
        let _guard = self.locks.lock(parent_id).await;
        self.require_folder(parent_id).await?;

        let name = self.names.resolve_unique_name(name, parent_id, None).await?;
        let file = Entry::file(
            new_id("file"),
            name,
            parent_id.cloned(),
            FileData::new(content, mime_type),
        );
        self.store.add(file.clone()).await?;
        tracing::info!(id = %file.id, name = %file.name, "file uploaded");
        Ok(file)
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename(&self, id: &EntryId, new_name: &str) -> Result<Entry> {
        validate_name(new_name)?;
        // Parents only change under the exclusive lock, so the scope read
        // here stays valid until the update lands.
        let _shared = self.structure.read().await;
        let scope = self.get(id).await?.parent_id;
        let _guard = self.locks.lock(scope.as_ref()).await;

        let mut entry = self.get(id).await?;
        entry.name = self
            .names
            .resolve_unique_name(new_name, entry.parent_id.as_ref(), Some(id))
            .await?;
        entry.touch();
        self.store.update(entry.clone()).await?;
        Ok(entry)
    }

    #[tracing::instrument(skip(self, content), fields(size = content.len()))]
    pub async fn replace_content(
        &self,
        id: &EntryId,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<Entry> {
        let _shared = self.structure.read().await;
        let mut entry = self.get(id).await?;
        if entry.is_folder() {
            return Err(Error::NotAFile(id.clone()));
        }
        entry.kind = EntryKind::File(FileData::new(content, mime_type));
        entry.touch();
        self.store.update(entry.clone()).await?;
        Ok(entry)
    }

    /// Re-parents an entry, resolving its name in the target scope.
    #[tracing::instrument(skip(self))]
    pub async fn move_entry(&self, id: &EntryId, target: Option<&EntryId>) -> Result<Entry> {
        let _exclusive = self.structure.write().await;

        let mut entry = self.get(id).await?;
        if entry.parent_id.as_ref() == target {
            return Ok(entry);
        }
        self.require_folder(target).await?;
        if let Some(target_id) = target {
            let inside_self = target_id == id
                || self
                    .navigator
                    .ancestor_chain(target_id)
                    .await?
                    .iter()
                    .any(|crumb| &crumb.id == id);
            if inside_self {
                return Err(Error::InvalidMove {
                    id: id.clone(),
                    target: target_id.clone(),
                });
            }
        }

        entry.name = self
            .names
            .resolve_unique_name(&entry.name, target, Some(id))
            .await?;
        entry.parent_id = target.cloned();
        entry.touch();
        self.store.update(entry.clone()).await?;
        Ok(entry)
    }

    /// Deletes a file, or a folder with its whole subtree. Returns the number
    /// of entries removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &EntryId) -> Result<usize> {
        let _exclusive = self.structure.write().await;
        let entry = self.get(id).await?;

        if entry.is_folder() {
            Ok(self.deleter.delete_recursively(id).await? + 1)
        } else {
            self.store.remove(id).await?;
            Ok(1)
        }
    }

    pub async fn list(
        &self,
        folder_id: Option<&EntryId>,
        key: SortKey,
        ascending: bool,
    ) -> Result<Vec<Entry>> {
        let mut entries = self.navigator.children_of(folder_id).await?;
        sort_entries(&mut entries, key, ascending);
        Ok(entries)
    }

    /// The ancestor chain plus the folder itself; empty at the root.
    pub async fn breadcrumbs(&self, folder_id: Option<&EntryId>) -> Result<Vec<Crumb>> {
        let Some(folder_id) = folder_id else {
            return Ok(Vec::new());
        };
        let folder = self.get(folder_id).await?;
        let mut crumbs = self.navigator.ancestor_chain(folder_id).await?;
        crumbs.push(Crumb::from(&folder));
        Ok(crumbs)
    }

    pub async fn folder_tree(&self) -> Result<Vec<FolderNode>> {
        let folders = self.store.get_by_type(EntryType::Folder).await?;
        Ok(build_folder_tree(folders))
    }

    pub async fn clear_all(&self) -> Result<()> {
        let _exclusive = self.structure.write().await;
        self.store.clear().await
    }

    async fn require_folder(&self, parent_id: Option<&EntryId>) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if self.get(parent_id).await?.is_folder() {
            Ok(())
        } else {
            Err(Error::InvalidParent(parent_id.clone()))
        }
    }
}

fn new_id(prefix: &str) -> EntryId {
    EntryId::new(format!("{prefix}-{}", Uuid::new_v4()))
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('/') || name.contains('\0') {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
