//! Error types for diffscope operations

use thiserror::Error;

/// Main error type for diffscope operations
#[derive(Error, Debug)]
pub enum DiffscopeError {
    #[error("git error: {message}")]
    Git { message: String },

    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("failed to decode client message: {message}")]
    Decode { message: String },

    #[error("event channel closed")]
    ChannelClosed,

    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for diffscope operations
pub type Result<T> = std::result::Result<T, DiffscopeError>;
