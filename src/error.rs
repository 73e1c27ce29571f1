//! Error type shared by the store and the UI.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Title was empty or whitespace only; nothing was written.
    #[error("The title cannot be empty.")]
    EmptyTitle,

    /// Import was requested but the export file does not exist.
    #[error("Import file not found: {}", .0.display())]
    ImportFileMissing(PathBuf),

    /// A row action was requested with no row selected.
    #[error("No task selected.")]
    NoSelection,

    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TaskError {
    /// Errors the UI reports in a dialog instead of aborting.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TaskError::EmptyTitle
                | TaskError::ImportFileMissing(_)
                | TaskError::NoSelection
                | TaskError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
