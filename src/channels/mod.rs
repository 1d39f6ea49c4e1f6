//! Channel implementations for the wheel game protocol.
//!
//! This module provides concrete [`EventChannel`](crate::EventChannel)
//! implementations behind feature gates. Enable the corresponding Cargo
//! feature to pull in a channel:
//!
//! | Feature             | Channel              |
//! |---------------------|----------------------|
//! | `channel-websocket` | [`WebSocketChannel`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), wheel_client::WheelClientError> {
//! use wheel_client::{WebSocketChannel, EventChannel};
//!
//! let mut ws = WebSocketChannel::connect("ws://localhost:8080/ws").await?;
//! ws.send(r#"{"type":"join_game"}"#.to_string()).await?;
//!
//! if let Some(Ok(event)) = ws.recv().await {
//!     println!("server said: {event}");
//! }
//!
//! ws.close().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "channel-websocket")]
pub mod websocket;

#[cfg(feature = "channel-websocket")]
pub use websocket::WebSocketChannel;
