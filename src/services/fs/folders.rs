use crate::models::entry::{Entry, EntryId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A folder with its sub-folders, as shown in a sidebar tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub id: EntryId,
    pub name: String,
    pub children: Vec<FolderNode>,
}

/// Builds the folder hierarchy reachable from the root. Files are ignored and
/// so is anything cut off from the root by a dangling or cyclic parent chain.
pub fn build_folder_tree(entries: Vec<Entry>) -> Vec<FolderNode> {
    let mut by_parent: HashMap<Option<EntryId>, Vec<Entry>> = HashMap::new();
    for entry in entries.into_iter().filter(Entry::is_folder) {
        by_parent.entry(entry.parent_id.clone()).or_default().push(entry);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }

    // Pre-order walk with an explicit stack; parents always precede children.
    let mut order: Vec<EntryId> = Vec::new();
    let mut visited: HashSet<EntryId> = HashSet::new();
    let mut stack: Vec<EntryId> = by_parent
        .get(&None)
        .map(|roots| roots.iter().rev().map(|e| e.id.clone()).collect())
        .unwrap_or_default();
    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        if let Some(children) = by_parent.get(&Some(id.clone())) {
            stack.extend(children.iter().rev().map(|e| e.id.clone()));
        }
        order.push(id);
    }

    let names: HashMap<EntryId, String> = by_parent
        .values()
        .flatten()
        .map(|e| (e.id.clone(), e.name.clone()))
        .collect();

    // Assemble bottom-up so every child node is finished before its parent.
    let mut built: HashMap<EntryId, FolderNode> = HashMap::new();
    for id in order.into_iter().rev() {
        let children = by_parent
            .get(&Some(id.clone()))
            .map(|children| {
                children
                    .iter()
                    .filter_map(|child| built.remove(&child.id))
                    .collect()
            })
            .unwrap_or_default();
        let name = names.get(&id).cloned().unwrap_or_default();
        built.insert(id.clone(), FolderNode { id, name, children });
    }

    by_parent
        .get(&None)
        .map(|roots| roots.iter().filter_map(|r| built.remove(&r.id)).collect())
        .unwrap_or_default()
}
