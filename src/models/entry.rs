use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Opaque, immutable identifier of an entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self((nanos / 1_000_000) as i64)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000).ok()
    }
}

/// Payload carried only by file entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub content: Vec<u8>,
    pub size: u64,
    pub mime_type: String,
}

impl FileData {
    pub fn new(content: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let size = content.len() as u64;
        Self {
            content,
            size,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File(FileData),
}

impl EntryKind {
    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryKind::Folder => EntryType::Folder,
            EntryKind::File(_) => EntryType::File,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.entry_type().as_str()
    }
}

/// Payload-free discriminator of [`EntryKind`], used for the type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryType {
    Folder,
    File,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Folder => "folder",
            EntryType::File => "file",
        }
    }
}

/// A node of the virtual tree, either a folder or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    pub kind: EntryKind,
    pub parent_id: Option<EntryId>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl Entry {
    pub fn folder(id: EntryId, name: impl Into<String>, parent_id: Option<EntryId>) -> Self {
        Self::with_kind(id, name, parent_id, EntryKind::Folder)
    }

    pub fn file(
        id: EntryId,
        name: impl Into<String>,
        parent_id: Option<EntryId>,
        data: FileData,
    ) -> Self {
        Self::with_kind(id, name, parent_id, EntryKind::File(data))
    }

    fn with_kind(
        id: EntryId,
        name: impl Into<String>,
        parent_id: Option<EntryId>,
        kind: EntryKind,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            name: name.into(),
            kind,
            parent_id,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.kind.entry_type()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder)
    }

    pub fn file_data(&self) -> Option<&FileData> {
        match &self.kind {
            EntryKind::File(data) => Some(data),
            EntryKind::Folder => None,
        }
    }

    pub fn size(&self) -> u64 {
        self.file_data().map(|data| data.size).unwrap_or(0)
    }

    /// Refreshes `modified_at`, never moving it backwards.
    pub fn touch(&mut self) {
        self.modified_at = Timestamp::now().max(self.modified_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_data_records_payload_length() {
        let data = FileData::new(b"%PDF-1.7".to_vec(), "application/pdf");
        assert_eq!(data.size, 8);
    }

    #[test]
    fn folders_carry_no_file_payload() {
        let folder = Entry::folder("folder-a".into(), "A", None);
        assert!(folder.is_folder());
        assert!(folder.file_data().is_none());
        assert_eq!(folder.size(), 0);
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut entry = Entry::folder("folder-a".into(), "A", None);
        let future = Timestamp(entry.modified_at.as_millis() + 60_000);
        entry.modified_at = future;
        entry.touch();
        assert_eq!(entry.modified_at, future);
    }
}
