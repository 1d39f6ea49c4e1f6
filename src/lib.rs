//! # Wheel Client
//!
//! Transport-agnostic Rust client core for a round-based multiplayer wheel
//! lottery game.
//!
//! The server owns the game: it accepts joins, runs the countdown, draws a
//! winner, and pushes state as JSON events. This crate is the client's
//! presentation core — it reconciles the pushed event stream into a
//! consistent local snapshot, derives a randomized seat grid that grows
//! with the roster, formats the countdown, gates the join action to valid
//! windows, and sequences transient UI effects (toasts, the winner popup,
//! a deferred reload) without overlapping or leaking timers.
//!
//! ## Features
//!
//! - **Channel-agnostic** — implement the [`EventChannel`] trait for any
//!   bidirectional text-message backend
//! - **View-agnostic** — implement the [`ViewBinding`] trait to render to
//!   any surface; the core never touches rendering primitives
//! - **WebSocket built-in** — the default `channel-websocket` feature
//!   provides [`WebSocketChannel`]
//! - **Deterministically testable** — the reducer and layout engine are
//!   pure, and every timer is driven by the tokio clock
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let channel = WebSocketChannel::connect("ws://localhost:8080/ws").await?;
//! let handle = WheelController::start(channel, my_view, WheelConfig::new());
//!
//! // Joining is only accepted while the window is open.
//! if handle.can_join() {
//!     handle.join_game()?;
//! }
//! ```

pub mod channel;
pub mod channels;
pub mod controller;
pub mod effects;
pub mod error;
pub mod layout;
pub mod protocol;
pub mod store;
pub mod timer_text;
pub mod view;

// Re-export primary types for ergonomic imports.
pub use channel::EventChannel;
pub use controller::{ChannelRetryPolicy, WheelConfig, WheelController, WheelHandle};
pub use effects::{EffectClass, EffectHandle, EffectPayload, EffectScheduler, ToastKind};
pub use error::WheelClientError;
pub use layout::{assign_seats, tier_for, CapacityTier};
pub use protocol::{ClientRequest, GameStatus, Player, ServerEvent, Winner};
pub use store::{can_join, ChangeSet, GameSnapshot, GameStateStore};
pub use view::{GridModel, RosterEntry, SeatState, SeatView, ViewBinding};

#[cfg(feature = "channel-websocket")]
pub use channels::WebSocketChannel;
