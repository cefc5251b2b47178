use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Permission denied: {0}")]
    AuthorizationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Corrupt data: {0}")]
    CorruptData(String),
}

impl LedgerError {
    /// Stable tag used in command envelopes and audit events.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::RusqliteError(_) => "storage",
            LedgerError::IoError(_) => "io",
            LedgerError::ConfigError(_) => "config",
            LedgerError::ValidationError(_) => "validation",
            LedgerError::AuthorizationError(_) => "authorization",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::CorruptData(_) => "corrupt_data",
        }
    }
}
