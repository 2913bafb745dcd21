/// Error types for the CoShop client.
/// Every fallible client operation returns one of these; `kind()` groups them
/// into the categories the UI layer reacts to.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not logged in: set a username first")]
    NotLoggedIn,

    #[error("Invalid room: {0}")]
    InvalidRoom(String),

    #[error("Already in room {0}")]
    AlreadyInRoom(String),

    #[error("Not in a room")]
    NotInRoom,

    #[error("Only the host can end room {0}")]
    NotHost(String),

    #[error("Invalid promo code: {0}")]
    InvalidPromo(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Server communication error: {0}")]
    ServerError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DbError(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any network call.
    Validation,
    /// The room service or the real-time channel failed.
    Network,
    /// A payload or stored value had the wrong shape.
    Data,
    /// The operation does not apply in the current session state.
    State,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::ValidationError(_)
            | ClientError::InvalidPromo(_)
            | ClientError::InvalidCommand(_)
            | ClientError::ProductNotFound(_) => ErrorKind::Validation,
            ClientError::NotLoggedIn
            | ClientError::AlreadyInRoom(_)
            | ClientError::NotInRoom
            | ClientError::NotHost(_) => ErrorKind::State,
            ClientError::InvalidRoom(_)
            | ClientError::ServerError(_)
            | ClientError::HttpError(_)
            | ClientError::WebSocketError(_) => ErrorKind::Network,
            ClientError::ConfigError(_)
            | ClientError::IoError(_)
            | ClientError::DbError(_)
            | ClientError::JsonError(_) => ErrorKind::Data,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
