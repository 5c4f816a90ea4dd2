use crate::core::errors::Result;
use crate::models::entry::{Entry, EntryId};
use crate::services::store::EntryStore;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// One step of an ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub id: EntryId,
    pub name: String,
}

impl From<&Entry> for Crumb {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
        }
    }
}

/// Read-side views derived from the store. Holds no state of its own, so
/// every answer reflects the store at the time of the call.
#[derive(Clone)]
pub struct Navigator {
    store: EntryStore,
}

impl Navigator {
    pub fn new(store: EntryStore) -> Self {
        Self { store }
    }

    pub async fn children_of(&self, folder_id: Option<&EntryId>) -> Result<Vec<Entry>> {
        self.store.get_by_parent(folder_id).await
    }

    /// Ancestors of `folder_id` in root-to-parent order, excluding the folder
    /// itself. A dangling parent reference ends the walk early.
    pub async fn ancestor_chain(&self, folder_id: &EntryId) -> Result<Vec<Crumb>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([folder_id.clone()]);

        let Some(start) = self.store.get_by_id(folder_id).await? else {
            return Ok(chain);
        };
        let mut next = start.parent_id;

        while let Some(id) = next {
            if !visited.insert(id.clone()) {
                tracing::warn!(%id, "cycle in parent chain, stopping walk");
                break;
            }
            let Some(ancestor) = self.store.get_by_id(&id).await? else {
                tracing::debug!(%id, "ancestor missing, treating as root");
                break;
            };
            chain.push(Crumb::from(&ancestor));
            next = ancestor.parent_id;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Every entry below `id`, breadth first. Entries reached twice are
    /// skipped, so corrupted cyclic data terminates.
    pub async fn descendants_of(&self, id: &EntryId) -> Result<Vec<Entry>> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::from([id.clone()]);
        let mut worklist = VecDeque::from([id.clone()]);

        while let Some(current) = worklist.pop_front() {
            for child in self.store.get_by_parent(Some(&current)).await? {
                if !visited.insert(child.id.clone()) {
                    tracing::warn!(id = %child.id, "cycle below '{}', skipping", current);
                    continue;
                }
                if child.is_folder() {
                    worklist.push_back(child.id.clone());
                }
                descendants.push(child);
            }
        }

        Ok(descendants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::FileData;

    async fn seed(store: &EntryStore, id: &str, parent: Option<&str>) -> Result<()> {
        store
            .add(Entry::folder(id.into(), id.to_uppercase(), parent.map(EntryId::from)))
            .await
    }

    #[tokio::test]
    async fn ancestor_chain_is_root_to_parent() -> Result<()> {
        let store = EntryStore::in_memory();
        seed(&store, "a", None).await?;
        seed(&store, "b", Some("a")).await?;
        seed(&store, "c", Some("b")).await?;
        seed(&store, "d", Some("c")).await?;
        let navigator = Navigator::new(store);

        let chain = navigator.ancestor_chain(&"d".into()).await?;
        let names: Vec<_> = chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        assert!(navigator.ancestor_chain(&"a".into()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ancestor_chain_stops_at_missing_parent() -> Result<()> {
        let store = EntryStore::in_memory();
        seed(&store, "b", Some("gone")).await?;
        seed(&store, "c", Some("b")).await?;
        let navigator = Navigator::new(store);

        let chain = navigator.ancestor_chain(&"c".into()).await?;
        assert_eq!(chain, vec![Crumb { id: "b".into(), name: "B".into() }]);
        assert!(navigator.ancestor_chain(&"unknown".into()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn ancestor_chain_terminates_on_cycles() -> Result<()> {
        let store = EntryStore::in_memory();
        seed(&store, "a", Some("b")).await?;
        seed(&store, "b", Some("a")).await?;
        let navigator = Navigator::new(store);

        let chain = navigator.ancestor_chain(&"a".into()).await?;
        assert_eq!(chain.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn descendants_cover_the_whole_subtree() -> Result<()> {
        let store = EntryStore::in_memory();
        seed(&store, "a", None).await?;
        seed(&store, "b", Some("a")).await?;
        seed(&store, "c", Some("b")).await?;
        seed(&store, "other", None).await?;
        store
            .add(Entry::file(
                "x".into(),
                "x.pdf",
                Some("c".into()),
                FileData::new(vec![0; 4], "application/pdf"),
            ))
            .await?;
        let navigator = Navigator::new(store);

        let mut ids: Vec<_> = navigator
            .descendants_of(&"a".into())
            .await?
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, ["b", "c", "x"]);
        Ok(())
    }

    #[tokio::test]
    async fn descendants_skip_cycles() -> Result<()> {
        let store = EntryStore::in_memory();
        seed(&store, "a", Some("c")).await?;
        seed(&store, "b", Some("a")).await?;
        seed(&store, "c", Some("b")).await?;
        let navigator = Navigator::new(store);

        let descendants = navigator.descendants_of(&"a".into()).await?;
        assert_eq!(descendants.len(), 2);
        Ok(())
    }
}
