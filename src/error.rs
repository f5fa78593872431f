// src/error.rs
use crate::models::EntryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage location error: {0}")]
    Location(String), // e.g. no usable data directory
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Entry {0} not found")]
    NotFound(EntryId),
    #[error("No entry ids left")]
    IdsExhausted,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Classifier returned HTTP {0}")]
    Status(u16),
    #[error("Classifier response malformed: {0}")]
    Malformed(String),
    #[error("Classifier task ended before answering")]
    Aborted,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("A submission is already being analyzed")]
    Busy,
    #[error("Entry text cannot be blank")]
    BlankText,
    #[error("Submission ticket is no longer current")]
    StaleTicket,
    #[error("Entry {0} not found")]
    NotFound(EntryId),
    #[error("No entry ids left")]
    IdsExhausted,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<RepoError> for EditorError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => EditorError::NotFound(id),
            RepoError::IdsExhausted => EditorError::IdsExhausted,
            RepoError::Store(e) => EditorError::Store(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
}

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Journal error: {0}")]
    Repo(#[from] RepoError),
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),
    #[error("Classifier setup error: {0}")]
    Classifier(#[from] ClassifyError),
    #[error("CLI error: {0}")]
    Cli(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type RepoResult<T> = Result<T, RepoError>;
