//! Error types for Quay

use thiserror::Error;

/// Result type for Quay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Quay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while pushing a configuration to the running server
    #[error(transparent)]
    Push(#[from] PushError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from the administrative-API collaborator.
///
/// `Rejected` is the downstream server refusing an otherwise structurally
/// valid configuration for semantic reasons. The message is opaque to the
/// engine and passed through unmodified; it is a distinct class from every
/// structural error the engine itself can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The configuration never reached the server.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server received and refused the configuration.
    #[error("Rejected by server: {0}")]
    Rejected(String),
}
