//! Core error types for caduceus

use thiserror::Error;

/// Main error type for caduceus operations
#[derive(Error, Debug)]
pub enum CaduceusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("File preparation failed: {0}")]
    FilePreparation(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Iterator error: {0}")]
    Iterator(String),

    #[error("Copy to database failed: {0}")]
    CopyToDb(String),

    #[error("Aborting: a neighbouring worker already failed")]
    NeighbouringProcess,

    #[error("Database connection error: {0}")]
    ConnectionDatabase(String),

    #[error("Query execution error: {0}")]
    QueryExecution(String),

    #[error("Database reset error: {0}")]
    ResetDatabase(String),

    #[error("Not enough disk space for setup")]
    NotEnoughSpace,

    #[error("UniProt database is up to date, no update required")]
    NoUpdateRequired,

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for caduceus operations
pub type CaduceusResult<T> = Result<T, CaduceusError>;

impl CaduceusError {
    /// Whether this error is the normal "nothing to do" termination signal.
    pub fn is_no_update_required(&self) -> bool {
        matches!(self, CaduceusError::NoUpdateRequired)
    }
}

impl From<anyhow::Error> for CaduceusError {
    fn from(err: anyhow::Error) -> Self {
        CaduceusError::Setup(err.to_string())
    }
}
