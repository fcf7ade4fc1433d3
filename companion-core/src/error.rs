//! Error types for companion-core

use thiserror::Error;

/// Main error type for the companion-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// File watch setup error
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// No history provider registered under this id
    #[error("unknown history provider: {0}")]
    UnknownProvider(String),
}

/// Result type alias for companion-core
pub type Result<T> = std::result::Result<T, Error>;
