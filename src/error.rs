use thiserror::Error;

/// Classifies raw block-list errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListErrorKind {
    /// List source not configured
    NotConfigured,
    /// Raw list could not be opened or read
    Unreadable,
}

/// Classifies domain-cache errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheErrorKind {
    /// Cache file could not be read
    ReadFailed,
    /// Cache file could not be written
    WriteFailed,
}

/// Filtering core error types
#[derive(Error, Debug)]
pub enum AdBlockError {
    #[error("Block list error: {message}")]
    ListError {
        kind: ListErrorKind,
        message: String,
    },

    #[error("Cache error: {message}")]
    CacheError {
        kind: CacheErrorKind,
        message: String,
    },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdBlockError>;
