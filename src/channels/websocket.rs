//! WebSocket channel implementation using `tokio-tungstenite`.
//!
//! This module provides [`WebSocketChannel`], an [`EventChannel`]
//! implementation that carries the game's JSON text events over a WebSocket
//! connection. Both `ws://` and `wss://` URLs are supported; TLS is handled
//! transparently via [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream).
//!
//! Reconnection policy lives here, not in the controller: the core only
//! surfaces a [`ChannelRetryPolicy`], and
//! [`WebSocketChannel::connect_with_retry`] consumes it (bounded attempts,
//! fixed delay, per-attempt timeout).
//!
//! # Feature gate
//!
//! Only available when the `channel-websocket` feature is enabled (it is
//! enabled by default).

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::channel::EventChannel;
use crate::controller::ChannelRetryPolicy;
use crate::error::WheelClientError;

/// Type alias for the underlying WebSocket stream.
///
/// Public so that callers can build a [`WebSocketChannel`] from an existing
/// stream via [`WebSocketChannel::from_stream`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// An [`EventChannel`] backed by a WebSocket connection.
///
/// Translates between the wheel game's text-message protocol and WebSocket
/// frames. Non-text frames are skipped (binary with a warning, ping/pong
/// silently); a close frame ends the stream cleanly.
///
/// # Cancel Safety
///
/// [`recv`](EventChannel::recv) is cancel-safe: dropping the returned
/// future before completion does not consume or lose any messages, making
/// it safe inside `tokio::select!`.
#[derive(Debug)]
pub struct WebSocketChannel {
    stream: WsStream,
    closed: bool,
}

impl WebSocketChannel {
    /// Establish a new WebSocket connection to the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`WheelClientError::Io`] if the URL is invalid or the
    /// connection cannot be established. An underlying I/O error keeps its
    /// [`ErrorKind`](std::io::ErrorKind); other errors map to
    /// [`ErrorKind::Other`](std::io::ErrorKind::Other).
    pub async fn connect(url: &str) -> Result<Self, WheelClientError> {
        tracing::debug!(url = %url, "connecting to game server");

        let (stream, _response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
            let kind = match &e {
                tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
                _ => std::io::ErrorKind::Other,
            };
            WheelClientError::Io(std::io::Error::new(kind, e))
        })?;

        tracing::info!(url = %url, "WebSocket connection established");

        Ok(Self {
            stream,
            closed: false,
        })
    }

    /// Wrap an already-established WebSocket stream.
    ///
    /// Useful for custom TLS configuration, proxy headers, or any other
    /// connection setup that [`connect`](Self::connect) does not expose.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// Establish a connection according to a [`ChannelRetryPolicy`]:
    /// bounded attempts, a fixed delay between them, and a per-attempt
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error once the attempt budget is
    /// exhausted. A timed-out attempt records a [`WheelClientError::Io`]
    /// with [`ErrorKind::TimedOut`](std::io::ErrorKind::TimedOut).
    pub async fn connect_with_retry(
        url: &str,
        policy: &ChannelRetryPolicy,
    ) -> Result<Self, WheelClientError> {
        let attempts = policy.max_attempts.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match tokio::time::timeout(policy.connect_timeout, Self::connect(url)).await {
                Ok(Ok(channel)) => return Ok(channel),
                Ok(Err(e)) => {
                    tracing::warn!(url = %url, attempt, "connection attempt failed: {e}");
                    last_err = Some(e);
                }
                Err(_) => {
                    tracing::warn!(url = %url, attempt, "connection attempt timed out");
                    last_err = Some(WheelClientError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "connect timeout",
                    )));
                }
            }
            if attempt < attempts {
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
        Err(last_err.unwrap_or(WheelClientError::ChannelClosed))
    }
}

#[async_trait]
impl EventChannel for WebSocketChannel {
    async fn send(&mut self, message: String) -> Result<(), WheelClientError> {
        if self.closed {
            return Err(WheelClientError::ChannelClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| WheelClientError::ChannelSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, WheelClientError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Some(Err(WheelClientError::ChannelReceive(e.to_string())));
                }
                None => return None,
            };

            match msg {
                // `Utf8Bytes::to_string()` copies the payload; `Utf8Bytes`
                // does not expose the inner buffer by value.
                Message::Text(text) => return Some(Ok(text.to_string())),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "received WebSocket close frame");
                    return None;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // tungstenite auto-queues the pong reply; nothing to do.
                }
                Message::Binary(_) => {
                    tracing::warn!("received unexpected binary WebSocket frame, skipping");
                }
                Message::Frame(_) => {
                    // Never produced by the read half; kept for
                    // exhaustiveness.
                    tracing::debug!("received raw WebSocket frame, skipping");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), WheelClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| WheelClientError::ChannelSend(e.to_string()))
    }
}

#[cfg(test)]
#[cfg(feature = "channel-websocket")]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[test]
    fn websocket_channel_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketChannel>();
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let result = WebSocketChannel::connect("not-a-valid-url").await;
        let err = result.unwrap_err();
        assert!(matches!(err, WheelClientError::Io(_)));
    }

    /// Start a local WebSocket server that runs `handler` on the accepted
    /// connection and returns the address to connect to.
    async fn start_mock_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn recv_receives_text_messages() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Text(r#"{"type":"timer","data":{"time":30}}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut channel = WebSocketChannel::connect(&url).await.unwrap();
        let msg = channel.recv().await.unwrap().unwrap();
        assert!(msg.contains("timer"));
        assert!(channel.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after_binary".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut channel = WebSocketChannel::connect(&url).await.unwrap();
        let msg = channel.recv().await.unwrap().unwrap();
        assert_eq!(msg, "after_binary");
    }

    #[tokio::test]
    async fn send_after_close_returns_channel_closed() {
        let url =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut channel = WebSocketChannel::connect(&url).await.unwrap();
        channel.close().await.unwrap();

        let err = channel.send("oops".to_string()).await.unwrap_err();
        assert!(matches!(err, WheelClientError::ChannelClosed));
    }

    #[tokio::test]
    async fn double_close_is_idempotent() {
        let url =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut channel = WebSocketChannel::connect(&url).await.unwrap();
        channel.close().await.unwrap();
        channel.close().await.unwrap();
    }

    #[tokio::test]
    async fn retry_policy_is_bounded() {
        // Connection-refused on every attempt must exhaust the budget and
        // return the last error instead of looping.
        let policy = ChannelRetryPolicy {
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
            connect_timeout: Duration::from_millis(500),
        };
        let result = WebSocketChannel::connect_with_retry("ws://127.0.0.1:1", &policy).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn send_round_trip() {
        let url = start_mock_server(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(text)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        })
        .await;

        let mut channel = WebSocketChannel::connect(&url).await.unwrap();
        channel
            .send(r#"{"type":"join_game"}"#.to_string())
            .await
            .unwrap();

        let msg = channel.recv().await.unwrap().unwrap();
        assert_eq!(msg, r#"{"type":"join_game"}"#);
    }
}
