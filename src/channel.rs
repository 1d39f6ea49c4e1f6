//! Channel abstraction for the wheel game's push protocol.
//!
//! The [`EventChannel`] trait defines a bidirectional text message channel
//! between the client and the game server. The protocol uses JSON text
//! messages, so every channel implementation must handle message framing
//! internally (e.g., WebSocket frames, length-prefixed TCP).
//!
//! # Connection setup and retry
//!
//! Connection setup is intentionally NOT part of this trait — different
//! backends have fundamentally different connection parameters. Construct a
//! connected channel externally, then pass it to
//! `WheelController::start`. Reconnection and backoff are likewise the
//! channel's responsibility; [`crate::controller::WheelConfig`] only surfaces
//! the retry policy (attempt count, delay, connect timeout) so a channel
//! constructor can consume it.
//!
//! # Implementing a custom channel
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use wheel_client::error::WheelClientError;
//! use wheel_client::channel::EventChannel;
//!
//! struct MyChannel { /* ... */ }
//!
//! #[async_trait]
//! impl EventChannel for MyChannel {
//!     async fn send(&mut self, message: String) -> Result<(), WheelClientError> {
//!         // Send the JSON text message over your backend
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, WheelClientError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), WheelClientError> {
//!         // Gracefully shut down the connection
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::WheelClientError;

/// A bidirectional text message channel to the wheel game server.
///
/// Implementors shuttle serialized JSON strings between the client and
/// server. Each call to [`send`](EventChannel::send) transmits one complete
/// JSON message. Each call to [`recv`](EventChannel::recv) returns one
/// complete JSON message.
///
/// # Object Safety
///
/// This trait is object-safe, so `Box<dyn EventChannel>` works for dynamic
/// dispatch. However, `WheelController::start` accepts `impl EventChannel`
/// (monomorphized) for the common case.
///
/// # Cancel Safety
///
/// The [`recv`](EventChannel::recv) method **MUST** be cancel-safe because it
/// is used inside `tokio::select!`. If `recv` is cancelled before completion,
/// calling it again must not lose data. Channel-based implementations (e.g.,
/// wrapping `mpsc::Receiver`) are naturally cancel-safe.
#[async_trait]
pub trait EventChannel: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`WheelClientError::ChannelSend`] if the message could not be
    /// sent (e.g., connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), WheelClientError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a channel error occurred (e.g., [`WheelClientError::ChannelReceive`])
    /// - `None` — the connection was closed cleanly by the server
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](EventChannel)).
    async fn recv(&mut self) -> Option<Result<String, WheelClientError>>;

    /// Close the channel gracefully.
    ///
    /// After calling this method, subsequent calls to [`send`](EventChannel::send)
    /// and [`recv`](EventChannel::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations
    /// should still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), WheelClientError>;
}
