use super::navigator::Navigator;
use crate::core::errors::Result;
use crate::models::entry::EntryId;
use crate::services::store::EntryStore;

/// Removes an entry together with everything below it.
#[derive(Clone)]
pub struct DeleteEngine {
    store: EntryStore,
    navigator: Navigator,
}

impl DeleteEngine {
    pub fn new(store: EntryStore, navigator: Navigator) -> Self {
        Self { store, navigator }
    }

    /// Deletes children before their parents and `id` last, so a retry after
    /// a partial failure converges on the same end state. Returns how many
    /// descendants were removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_recursively(&self, id: &EntryId) -> Result<usize> {
        let descendants = self.navigator.descendants_of(id).await?;
        let count = descendants.len();

        // Discovery order is breadth first, so reversing it puts every child
        // ahead of its parent.
        for entry in descendants.iter().rev() {
            self.store.remove(&entry.id).await?;
        }
        self.store.remove(id).await?;

        tracing::info!(descendants = count, "deleted subtree");
        Ok(count)
    }
}
