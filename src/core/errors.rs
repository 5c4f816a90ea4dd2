use crate::models::entry::EntryId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("entry '{0}' already exists")]
    Conflict(EntryId),
    #[error("entry '{0}' not found")]
    NotFound(EntryId),
    #[error("entry '{0}' is not a folder")]
    InvalidParent(EntryId),
    #[error("entry '{0}' is not a file")]
    NotAFile(EntryId),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("cannot move '{id}' into '{target}': target is inside the moved folder")]
    InvalidMove { id: EntryId, target: EntryId },
    #[error("storage error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unknown(format!("corrupt entry record: {err}"))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Unknown(format!("store task failed: {err}"))
    }
}
