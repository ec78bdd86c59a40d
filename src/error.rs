use thiserror::Error;

use crate::storage::StorageError;

pub type QuestLogResult<T> = core::result::Result<T, QuestLogError>;

#[derive(Debug, Error)]
pub enum QuestLogError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("{0}")]
    Dialog(#[from] dialoguer::Error),
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },
    #[error("{0}")]
    InvalidInput(String),
}

impl QuestLogError {
    pub fn quest_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "quest",
            id: id.into(),
        }
    }

    pub fn group_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "group",
            id: id.into(),
        }
    }
}
