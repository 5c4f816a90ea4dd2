use crate::models::entry::Entry;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Type,
}

/// Flat, serializable view of an entry without its content.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub parent_id: Option<String>,
    pub size: u64,
    pub mime_type: Option<String>,
    pub created: i64,
    pub modified: i64,
}

impl From<&Entry> for EntrySummary {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            kind: entry.kind.as_str().to_string(),
            parent_id: entry.parent_id.as_ref().map(|id| id.to_string()),
            size: entry.size(),
            mime_type: entry.file_data().map(|data| data.mime_type.clone()),
            created: entry.created_at.as_millis(),
            modified: entry.modified_at.as_millis(),
        }
    }
}

pub fn sort_entries(entries: &mut [Entry], key: SortKey, asc: bool) {
    entries.sort_by(|a, b| {
        // Folders before files
        match b.is_folder().cmp(&a.is_folder()) {
            Ordering::Equal => {
                let order = match key {
                    SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                    SortKey::Size => a.size().cmp(&b.size()),
                    SortKey::Modified => a.modified_at.cmp(&b.modified_at),
                    SortKey::Type => get_extension(a).cmp(&get_extension(b)),
                };
                if asc {
                    order
                } else {
                    order.reverse()
                }
            }
            kind_order => kind_order,
        }
    });
}

pub fn get_extension(entry: &Entry) -> String {
    if entry.is_folder() {
        return "0_dir".to_string();
    }
    Path::new(&entry.name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "zzz_noext".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::FileData;

    fn file(name: &str, size: usize) -> Entry {
        Entry::file(
            name.into(),
            name,
            None,
            FileData::new(vec![0; size], "application/octet-stream"),
        )
    }

    #[test]
    fn folders_sort_first_regardless_of_direction() {
        let mut entries = vec![
            file("b.pdf", 1),
            Entry::folder("z".into(), "Zeta", None),
            file("a.txt", 3),
        ];

        sort_entries(&mut entries, SortKey::Name, false);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "b.pdf", "a.txt"]);
    }

    #[test]
    fn sort_by_type_groups_extensions() {
        let mut entries = vec![file("notes", 1), file("b.txt", 1), file("a.pdf", 1)];
        sort_entries(&mut entries, SortKey::Type, true);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.txt", "notes"]);
    }

    #[test]
    fn sort_by_size() {
        let mut entries = vec![file("big", 10), file("small", 1)];
        sort_entries(&mut entries, SortKey::Size, true);
        assert_eq!(entries[0].name, "small");
    }
}
