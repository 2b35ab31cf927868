//! Error types for the kubedeck host core.

/// Top-level error type for the desktop host process.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// Channel send/receive or transport error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Plugin lifecycle operation error.
    #[error("plugin error: {0}")]
    Plugin(String),

    /// Status cache read/write error.
    #[error("status error: {0}")]
    Status(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DeckError>;
