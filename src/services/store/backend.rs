use crate::core::errors::Result;
use crate::models::entry::{Entry, EntryId, EntryType};

/// Synchronous persistence contract behind [`super::EntryStore`].
///
/// Each call is atomic for the single record it touches. Implementations do
/// not enforce tree invariants; callers sequence calls to keep them.
pub trait EntryBackend: Send + Sync {
    fn get_all(&self) -> Result<Vec<Entry>>;
    fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>>;
    /// Must be answered from the parent index, not a full scan.
    fn get_by_parent(&self, parent_id: Option<&EntryId>) -> Result<Vec<Entry>>;
    /// Answered from the type index.
    fn get_by_type(&self, entry_type: EntryType) -> Result<Vec<Entry>>;
    /// Fails with `Conflict` if the id exists.
    fn add(&self, entry: &Entry) -> Result<()>;
    /// Upsert by id.
    fn update(&self, entry: &Entry) -> Result<()>;
    /// Absent ids are a no-op.
    fn remove(&self, id: &EntryId) -> Result<()>;
    fn clear(&self) -> Result<()>;
}
