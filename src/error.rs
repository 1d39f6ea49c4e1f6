//! Error types for the wheel client.

use thiserror::Error;

/// Errors that can occur when using the wheel client.
#[derive(Debug, Error)]
pub enum WheelClientError {
    /// Failed to send a message through the event channel.
    #[error("channel send error: {0}")]
    ChannelSend(String),

    /// Failed to receive a message from the event channel.
    #[error("channel receive error: {0}")]
    ChannelReceive(String),

    /// The event channel was closed unexpectedly.
    #[error("event channel closed")]
    ChannelClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted an operation that requires a live connection, but the
    /// controller has shut down or the channel has closed.
    #[error("not connected to server")]
    NotConnected,

    /// Attempted to join while the join window is closed (round in
    /// progress, break, or inside the final-seconds cutoff).
    #[error("joining is not open")]
    JoinNotOpen,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for wheel client operations.
pub type Result<T> = std::result::Result<T, WheelClientError>;
