//! A client-resident virtual file/folder store.
//!
//! Entries form a tree persisted in an embedded key-value store. The
//! [`services::fs::FileSystem`] service is the entry point for intents such as
//! creating folders, uploading files, renaming, moving and cascading deletes.

pub mod core;
pub mod models;
pub mod services;

pub use crate::core::config::StoreConfig;
pub use crate::core::errors::{Error, Result};
pub use crate::models::entry::{Entry, EntryId, EntryKind, EntryType, FileData, Timestamp};
pub use crate::services::fs::FileSystem;
pub use crate::services::store::EntryStore;
