#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for wheel client integration tests.
//!
//! Provides a scripted [`MockChannel`], a [`RecordingView`] that captures
//! every render the controller issues, and helper functions for building
//! common server event JSON strings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use wheel_client::effects::{EffectClass, EffectPayload};
use wheel_client::protocol::{GameStatus, Player, ServerEvent, Winner, WinnerRef};
use wheel_client::view::{GridModel, RosterEntry, ViewBinding};
use wheel_client::{EventChannel, WheelClientError};

// ── MockChannel ─────────────────────────────────────────────────────

/// A scripted mock channel for integration testing.
///
/// Scripted server events are consumed in order by `recv()`. All messages
/// sent by the client are recorded in `sent`.
pub struct MockChannel {
    /// Scripted server events (consumed in order by `recv`).
    incoming: std::collections::VecDeque<Option<Result<String, WheelClientError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockChannel {
    /// Create a new mock channel with the given scripted incoming events.
    ///
    /// Returns the channel plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, WheelClientError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let channel = Self {
            incoming: incoming.into(),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (channel, sent, closed)
    }
}

#[async_trait]
impl EventChannel for MockChannel {
    async fn send(&mut self, message: String) -> Result<(), WheelClientError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, WheelClientError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // No more scripted events — hang forever so the dispatch loop
            // stays alive until shutdown is called.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), WheelClientError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── RecordingView ───────────────────────────────────────────────────

/// A view binding that captures everything the controller renders.
///
/// Cheap to clone; all clones share the same recorded state, so tests can
/// keep one clone and hand the other to the controller.
#[derive(Clone, Default)]
pub struct RecordingView {
    inner: Arc<ViewState>,
}

#[derive(Default)]
struct ViewState {
    texts: StdMutex<HashMap<String, String>>,
    classes: StdMutex<HashMap<String, bool>>,
    join_enabled: AtomicBool,
    join_tooltip: StdMutex<String>,
    grid: StdMutex<Option<GridModel>>,
    roster: StdMutex<Vec<RosterEntry>>,
    shown: StdMutex<Vec<(EffectClass, EffectPayload)>>,
    live: StdMutex<Vec<EffectClass>>,
    reloads: AtomicUsize,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text of a render target, if any was ever set.
    pub fn text(&self, target: &str) -> Option<String> {
        self.inner.texts.lock().unwrap().get(target).cloned()
    }

    /// Whether `class` is currently toggled on for `target`.
    pub fn has_class(&self, target: &str, class: &str) -> bool {
        self.inner
            .classes
            .lock()
            .unwrap()
            .get(&format!("{target}.{class}"))
            .copied()
            .unwrap_or(false)
    }

    pub fn join_enabled(&self) -> bool {
        self.inner.join_enabled.load(Ordering::Acquire)
    }

    pub fn join_tooltip(&self) -> String {
        self.inner.join_tooltip.lock().unwrap().clone()
    }

    /// The most recently rendered grid, if any.
    pub fn grid(&self) -> Option<GridModel> {
        self.inner.grid.lock().unwrap().clone()
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.inner.roster.lock().unwrap().clone()
    }

    /// Every `(class, payload)` pair ever shown, in order.
    pub fn shown(&self) -> Vec<(EffectClass, EffectPayload)> {
        self.inner.shown.lock().unwrap().clone()
    }

    /// How many effects of `class` were ever shown.
    pub fn shown_count(&self, class: EffectClass) -> usize {
        self.inner
            .shown
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == class)
            .count()
    }

    /// Whether an effect of `class` is currently on screen (shown and not
    /// yet removed).
    pub fn effect_live(&self, class: EffectClass) -> bool {
        self.inner.live.lock().unwrap().contains(&class)
    }

    pub fn reloads(&self) -> usize {
        self.inner.reloads.load(Ordering::Acquire)
    }
}

impl ViewBinding for RecordingView {
    fn set_text(&self, target: &str, text: &str) {
        self.inner
            .texts
            .lock()
            .unwrap()
            .insert(target.to_string(), text.to_string());
    }

    fn toggle_class(&self, target: &str, class: &str, on: bool) {
        self.inner
            .classes
            .lock()
            .unwrap()
            .insert(format!("{target}.{class}"), on);
    }

    fn set_join_enabled(&self, enabled: bool, tooltip: &str) {
        self.inner.join_enabled.store(enabled, Ordering::Release);
        *self.inner.join_tooltip.lock().unwrap() = tooltip.to_string();
    }

    fn render_grid(&self, grid: &GridModel) {
        *self.inner.grid.lock().unwrap() = Some(grid.clone());
    }

    fn render_roster(&self, roster: &[RosterEntry]) {
        *self.inner.roster.lock().unwrap() = roster.to_vec();
    }

    fn show_effect(&self, class: EffectClass, payload: &EffectPayload) {
        self.inner.shown.lock().unwrap().push((class, payload.clone()));
        self.inner.live.lock().unwrap().push(class);
    }

    fn begin_effect_hide(&self, _class: EffectClass) {}

    fn remove_effect(&self, class: EffectClass) {
        self.inner.live.lock().unwrap().retain(|c| *c != class);
    }

    fn request_reload(&self) {
        self.inner.reloads.fetch_add(1, Ordering::AcqRel);
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// A roster entry with the given name; every test player gets the same
/// placeholder emoji unless built by hand.
pub fn player(username: &str) -> Player {
    Player {
        username: username.to_string(),
        emoji: "\u{1F3B2}".to_string(),
        prize: None,
    }
}

/// A roster of `count` players named `p0..p{count-1}`.
pub fn roster(count: usize) -> Vec<Player> {
    (0..count).map(|i| player(&format!("p{i}"))).collect()
}

/// Returns the JSON string for a full `game_status` broadcast.
pub fn game_status_json(players: Vec<Player>, status: GameStatus, timer: u32) -> String {
    serde_json::to_string(&ServerEvent::GameStatus {
        players: Some(players),
        status: Some(status),
        timer: Some(timer),
        is_break: Some(status == GameStatus::Break),
    })
    .expect("game_status serialization")
}

/// Returns the JSON string for a successful `player_joined` broadcast.
pub fn player_joined_json(players: Vec<Player>, new_player: Player, message: &str) -> String {
    let count = players.len();
    serde_json::to_string(&ServerEvent::PlayerJoined {
        success: true,
        players: Some(players),
        new_player: Some(new_player),
        message: Some(message.to_string()),
        player_count: Some(count),
    })
    .expect("player_joined serialization")
}

/// Returns the JSON string for a rejected `player_joined` response.
pub fn join_rejected_json(message: &str) -> String {
    serde_json::to_string(&ServerEvent::PlayerJoined {
        success: false,
        players: None,
        new_player: None,
        message: Some(message.to_string()),
        player_count: None,
    })
    .expect("player_joined rejection serialization")
}

/// Returns the JSON string for a `winner_selected` event.
pub fn winner_selected_json(username: &str, prize: u64, wallet_balance: Option<u64>) -> String {
    serde_json::to_string(&ServerEvent::WinnerSelected {
        winner: Some(Winner {
            username: username.to_string(),
            emoji: "\u{1F3B2}".to_string(),
            prize,
            wallet_balance,
        }),
    })
    .expect("winner_selected serialization")
}

/// Returns the JSON string for a `game_end` event carrying only a username.
pub fn game_end_username_json(username: &str) -> String {
    serde_json::to_string(&ServerEvent::GameEnd {
        winner: Some(WinnerRef::Username(username.to_string())),
    })
    .expect("game_end serialization")
}

/// Returns the JSON string for a once-per-second `timer` tick.
pub fn timer_json(time: u32) -> String {
    serde_json::to_string(&ServerEvent::Timer {
        time,
        is_break: Some(false),
    })
    .expect("timer serialization")
}

/// Returns the JSON string for a `break_timer` event.
pub fn break_timer_json(duration: u32) -> String {
    serde_json::to_string(&ServerEvent::BreakTimer { duration }).expect("break_timer serialization")
}
