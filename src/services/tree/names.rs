use super::navigator::Navigator;
use crate::core::errors::Result;
use crate::models::entry::EntryId;
use std::collections::HashSet;

/// Rewrites proposed names so they do not collide with siblings.
#[derive(Clone)]
pub struct NameResolver {
    navigator: Navigator,
}

impl NameResolver {
    pub fn new(navigator: Navigator) -> Self {
        Self { navigator }
    }

    /// Returns `proposed` if no sibling under `parent_id` uses it, otherwise
    /// the first free `"{stem} (n){ext}"`. `exclude_id` is left out of the
    /// sibling set so an entry never collides with itself on rename.
    pub async fn resolve_unique_name(
        &self,
        proposed: &str,
        parent_id: Option<&EntryId>,
        exclude_id: Option<&EntryId>,
    ) -> Result<String> {
        let siblings = self.navigator.children_of(parent_id).await?;
        let taken: HashSet<String> = siblings
            .into_iter()
            .filter(|entry| Some(&entry.id) != exclude_id)
            .map(|entry| entry.name)
            .collect();

        let resolved = unique_name(proposed, &taken);
        if resolved != proposed {
            tracing::debug!(proposed, resolved = %resolved, "renamed to avoid sibling collision");
        }
        Ok(resolved)
    }
}

/// Splits at the last `.`; a leading dot is part of the stem.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

pub fn unique_name(proposed: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(proposed) {
        return proposed.to_string();
    }

    let (stem, extension) = split_extension(proposed);
    let mut counter = 1u64;
    loop {
        let candidate = format!("{stem} ({counter}){extension}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
