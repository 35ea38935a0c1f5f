use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormVaultError {
    #[error("Page agent is not responding. Reload the page snapshot and try again.")]
    AgentUnavailable,

    #[error("Cannot run on restricted page: {0}")]
    RestrictedPage(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("No matching profile found for this page")]
    NoMatchingProfile,

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Import rejected: {0}")]
    ImportError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FormVaultError>;
