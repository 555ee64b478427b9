use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying failure carried by [`Error::Execution`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required environment value is missing or empty.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A config file could not be read or parsed.
    #[error("config file error: {0}")]
    Config(String),

    #[error("malformed migration {id}: {reason}")]
    MalformedMigration { id: String, reason: String },

    #[error("migration {id} failed: {source}")]
    Execution {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("ledger is locked by another run: {}", .0.display())]
    Locked(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a dispatch failure, tagging it with the descriptor id.
    pub fn execution(id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Execution {
            id: id.into(),
            source: source.into(),
        }
    }

    /// The descriptor id this error is tagged with, if any.
    pub fn migration_id(&self) -> Option<&str> {
        match self {
            Error::MalformedMigration { id, .. } | Error::Execution { id, .. } => Some(id),
            _ => None,
        }
    }
}
