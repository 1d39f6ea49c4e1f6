//! Presentation controller for the wheel game.
//!
//! [`WheelController::start`] spawns a single background dispatch task that
//! consumes server events from an injected [`EventChannel`], reduces them
//! into the local [`GameStateStore`], and renders the result through an
//! injected [`ViewBinding`] — grid, roster, countdown text, join gating, and
//! the scheduled effects of [`EffectScheduler`]. The returned [`WheelHandle`]
//! is a thin handle exposing the outbound join action and teardown.
//!
//! # Example
//!
//! ```rust,ignore
//! let channel = connect_somehow().await;
//! let view = MyDomView::new();
//! let handle = WheelController::start(channel, view, WheelConfig::new());
//!
//! handle.join_game()?;
//! // ... later
//! handle.shutdown().await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::channel::EventChannel;
use crate::effects::{EffectClass, EffectExpiry, EffectPayload, EffectScheduler, ToastKind};
use crate::error::{Result, WheelClientError};
use crate::layout::{assign_seats, tier_for, CapacityTier};
use crate::protocol::{ClientRequest, GameStatus, ServerEvent, Winner, WinnerRef, PALETTE_SIZE};
use crate::store::{can_join, GameStateStore};
use crate::timer_text;
use crate::view::{targets, GridModel, RosterEntry, SeatState, SeatView, ViewBinding, BREAK_TIMER_CLASS};

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Retry policy surfaced to channel constructors.
///
/// The core itself never retries; reconnection and backoff belong to the
/// [`EventChannel`] implementation. This struct only carries the
/// configuration through to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRetryPolicy {
    /// Bounded number of connection attempts.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Timeout for a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for ChannelRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration for a [`WheelController`].
///
/// Everything has a sensible default.
///
/// # Example
///
/// ```
/// use wheel_client::controller::WheelConfig;
/// use std::time::Duration;
///
/// let config = WheelConfig::new()
///     .with_join_cutoff_seconds(10)
///     .with_toast_duration(Duration::from_secs(3));
/// assert_eq!(config.join_cutoff_seconds, 10);
/// ```
#[derive(Debug, Clone)]
pub struct WheelConfig {
    /// Trailing seconds of the join window during which joining is blocked
    /// even though the round is nominally still open.
    pub join_cutoff_seconds: u32,
    /// How long a notification toast stays visible.
    pub toast_duration: Duration,
    /// How long the grid-expansion banner stays visible.
    pub expansion_notice_duration: Duration,
    /// How long the winner popup stays visible.
    pub winner_popup_duration: Duration,
    /// Delay between a winner announcement and the forced full reload.
    pub reload_delay: Duration,
    /// Timeout for the graceful shutdown.
    ///
    /// When [`WheelHandle::shutdown`] is called, the dispatch loop is given
    /// this much time to close the channel and tear down; if the timeout
    /// expires the task is aborted.
    pub shutdown_timeout: Duration,
    /// Channel retry policy, surfaced for channel constructors.
    pub retry: ChannelRetryPolicy,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            join_cutoff_seconds: 10,
            toast_duration: Duration::from_millis(3000),
            expansion_notice_duration: Duration::from_millis(2000),
            winner_popup_duration: Duration::from_millis(5000),
            reload_delay: Duration::from_millis(6000),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            retry: ChannelRetryPolicy::default(),
        }
    }
}

impl WheelConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the join-gating cutoff in seconds.
    #[must_use]
    pub fn with_join_cutoff_seconds(mut self, seconds: u32) -> Self {
        self.join_cutoff_seconds = seconds;
        self
    }

    /// Set how long a notification toast stays visible.
    #[must_use]
    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    /// Set how long the winner popup stays visible.
    #[must_use]
    pub fn with_winner_popup_duration(mut self, duration: Duration) -> Self {
        self.winner_popup_duration = duration;
        self
    }

    /// Set the delay before the post-winner forced reload.
    #[must_use]
    pub fn with_reload_delay(mut self, duration: Duration) -> Self {
        self.reload_delay = duration;
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the retry policy surfaced to channel constructors.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: ChannelRetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// State shared between the handle and the dispatch loop.
struct SharedState {
    connected: AtomicBool,
    can_join: AtomicBool,
    status: AtomicU8,
}

fn status_to_u8(status: GameStatus) -> u8 {
    match status {
        GameStatus::Joining => 0,
        GameStatus::InProgress => 1,
        GameStatus::Break => 2,
        GameStatus::Ended => 3,
    }
}

fn status_from_u8(raw: u8) -> GameStatus {
    match raw {
        1 => GameStatus::InProgress,
        2 => GameStatus::Break,
        3 => GameStatus::Ended,
        _ => GameStatus::Joining,
    }
}

impl SharedState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            can_join: AtomicBool::new(false),
            status: AtomicU8::new(status_to_u8(GameStatus::Joining)),
        }
    }
}

/// Outbound commands from the handle to the dispatch loop.
enum ControllerCommand {
    Join,
}

// ── Handle ──────────────────────────────────────────────────────────

/// Entry point: starts the dispatch loop. See [`WheelController::start`].
pub struct WheelController;

/// Thin handle to a running controller.
///
/// All methods queue work for the dispatch loop and return immediately; the
/// join request's acknowledgement arrives as a `player_joined` event, not a
/// return value.
pub struct WheelHandle {
    cmd_tx: mpsc::UnboundedSender<ControllerCommand>,
    state: Arc<SharedState>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl WheelController {
    /// Start the dispatch loop and return the handle.
    ///
    /// # Arguments
    ///
    /// * `channel` — A connected [`EventChannel`] implementation.
    /// * `view` — The rendering capability.
    /// * `config` — Durations, the join cutoff, and the surfaced retry policy.
    pub fn start(
        channel: impl EventChannel,
        view: impl ViewBinding,
        config: WheelConfig,
    ) -> WheelHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(SharedState::new());
        let loop_state = Arc::clone(&state);
        let shutdown_timeout = config.shutdown_timeout;

        let task = tokio::spawn(dispatch_loop(
            channel,
            Arc::new(view),
            config,
            cmd_rx,
            loop_state,
            shutdown_rx,
        ));

        WheelHandle {
            cmd_tx,
            state,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout,
        }
    }
}

impl WheelHandle {
    /// Request to join the current round.
    ///
    /// The join affordance is optimistically disabled; it is re-enabled by
    /// the server's response (`player_joined`, including rejections) or the
    /// next `game_status` broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`WheelClientError::NotConnected`] if the channel has closed,
    /// or [`WheelClientError::JoinNotOpen`] when gating currently blocks
    /// joining (round in progress, break, or inside the cutoff window).
    pub fn join_game(&self) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(WheelClientError::NotConnected);
        }
        if !self.state.can_join.load(Ordering::Acquire) {
            return Err(WheelClientError::JoinNotOpen);
        }
        self.cmd_tx
            .send(ControllerCommand::Join)
            .map_err(|_| WheelClientError::NotConnected)
    }

    /// Returns `true` if the channel is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// Whether the join window is currently open.
    pub fn can_join(&self) -> bool {
        self.state.can_join.load(Ordering::Acquire)
    }

    /// The round phase as last reported by the server.
    pub fn status(&self) -> GameStatus {
        status_from_u8(self.state.status.load(Ordering::Acquire))
    }

    /// Shut down the controller, closing the channel and stopping the
    /// dispatch loop. All outstanding effect timers are cancelled so
    /// nothing fires against a torn-down view.
    pub async fn shutdown(&mut self) {
        debug!("WheelHandle: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the loop with a timeout; abort if it does not exit in time
        // so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("dispatch loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("dispatch loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("dispatch loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for WheelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WheelHandle")
            .field("connected", &self.is_connected())
            .field("can_join", &self.can_join())
            .field("status", &self.status())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for WheelHandle {
    fn drop(&mut self) {
        // `Drop` is synchronous, so the only safe action is to abort the
        // spawned task; the loop future (and the scheduler it owns, whose
        // own Drop aborts every effect timer) is dropped immediately.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Dispatch loop ───────────────────────────────────────────────────

/// Single dispatch task multiplexing commands, channel events, effect
/// expiries, and shutdown via `tokio::select!`.
///
/// Exits when:
/// - The command channel closes (handle dropped or shutdown called)
/// - The event channel returns `None` (server closed the connection)
/// - A channel error occurs
async fn dispatch_loop<C: EventChannel, V: ViewBinding>(
    mut channel: C,
    view: Arc<V>,
    config: WheelConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<ControllerCommand>,
    state: Arc<SharedState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("dispatch loop started");

    let (scheduler, mut expiry_rx) = EffectScheduler::new(Arc::clone(&view));
    let mut core = ControllerCore {
        store: GameStateStore::new(),
        scheduler,
        view,
        config,
        state,
        current_tier: tier_for(0),
    };

    // Synthetic connect: clear any connection-error status text and render
    // the initial empty state.
    core.on_connected();

    loop {
        tokio::select! {
            // Branch 1: outbound command from the handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ControllerCommand::Join) => {
                        if let Err(e) = send_join(&mut channel, &mut core).await {
                            error!("channel send error: {e}");
                            core.on_disconnected(Some(format!("channel send error: {e}")));
                            break;
                        }
                    }
                    // Command channel closed — handle dropped.
                    None => {
                        debug!("command channel closed, shutting down dispatch loop");
                        let _ = channel.close().await;
                        core.on_disconnected(Some("client shut down".into()));
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = channel.close().await;
                core.on_disconnected(Some("client shut down".into()));
                break;
            }

            // Branch 3: incoming event from the server
            incoming = channel.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => core.handle_event(event),
                            Err(e) => {
                                warn!("failed to deserialize server event: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("channel receive error: {e}");
                        core.on_disconnected(Some(format!("channel receive error: {e}")));
                        break;
                    }
                    // Channel closed cleanly.
                    None => {
                        debug!("channel closed by server");
                        core.on_disconnected(None);
                        break;
                    }
                }
            }

            // Branch 4: an effect ran to completion
            expiry = expiry_rx.recv() => {
                if let Some(expiry) = expiry {
                    core.handle_expiry(expiry);
                }
            }
        }
    }

    debug!("dispatch loop exited");
}

/// Serialize and send the join request, after optimistically disabling the
/// affordance.
async fn send_join<C: EventChannel, V: ViewBinding>(
    channel: &mut C,
    core: &mut ControllerCore<V>,
) -> Result<()> {
    let snapshot = core.store.snapshot();
    if !can_join(
        snapshot.status,
        snapshot.is_break(),
        snapshot.timer_seconds,
        core.config.join_cutoff_seconds,
    ) {
        // The window closed between the handle's check and dispatch.
        debug!("join command ignored, window is closed");
        return Ok(());
    }

    core.view.set_join_enabled(false, "Join request pending");
    core.state.can_join.store(false, Ordering::Release);
    core.view.set_text(targets::GAME_STATUS, "Joining game...");

    let json = serde_json::to_string(&ClientRequest::JoinGame)?;
    channel.send(json).await
}

// ── Core ────────────────────────────────────────────────────────────

/// Reducer-plus-effects layer driven by the dispatch loop: applies each
/// event to the store, reads the resulting diff, and issues view and timer
/// commands.
struct ControllerCore<V: ViewBinding> {
    store: GameStateStore,
    scheduler: EffectScheduler<V>,
    view: Arc<V>,
    config: WheelConfig,
    state: Arc<SharedState>,
    current_tier: CapacityTier,
}

impl<V: ViewBinding> ControllerCore<V> {
    fn on_connected(&mut self) {
        self.state.connected.store(true, Ordering::Release);
        self.view.set_text(targets::GAME_STATUS, "");
        self.render_players(None);
        self.render_timer();
        self.refresh_gating();
    }

    fn on_disconnected(&mut self, reason: Option<String>) {
        self.state.connected.store(false, Ordering::Release);
        self.state.can_join.store(false, Ordering::Release);
        self.scheduler.cancel_all();
        let text = match &reason {
            Some(reason) => format!("Connection lost: {reason}"),
            None => "Connection closed".to_string(),
        };
        self.view.set_text(targets::GAME_STATUS, &text);
        self.view.set_join_enabled(false, "Not connected");
    }

    /// Apply one server event and render its consequences.
    fn handle_event(&mut self, event: ServerEvent) {
        let changes = self.store.apply(&event);
        self.state
            .status
            .store(status_to_u8(self.store.snapshot().status), Ordering::Release);

        match event {
            ServerEvent::GameStatus { .. } => {
                // A fresh round must not race a stale post-winner reload.
                self.scheduler.cancel_class(EffectClass::DeferredReload);
                if changes.players {
                    self.update_tier();
                    self.render_players(None);
                }
                self.render_timer();
                self.refresh_gating();
            }
            ServerEvent::PlayerJoined {
                success: true,
                new_player,
                message,
                ..
            } => {
                if let Some(message) = message {
                    let text = match &new_player {
                        Some(player) if !player.emoji.is_empty() => {
                            format!("{} {}", player.emoji, message)
                        }
                        _ => message,
                    };
                    self.scheduler.schedule(
                        EffectClass::Toast,
                        Some(EffectPayload::Toast {
                            message: text,
                            kind: ToastKind::Success,
                        }),
                        self.config.toast_duration,
                    );
                }
                if changes.players {
                    self.update_tier();
                    self.render_players(None);
                }
                self.refresh_gating();
            }
            ServerEvent::PlayerJoined {
                success: false,
                message,
                ..
            } => {
                if let Some(message) = &message {
                    self.scheduler.schedule(
                        EffectClass::Toast,
                        Some(EffectPayload::Toast {
                            message: message.clone(),
                            kind: ToastKind::Error,
                        }),
                        self.config.toast_duration,
                    );
                    self.view.set_text(targets::GAME_STATUS, message);
                }
                // A rejected join must re-enable the affordance.
                self.refresh_gating();
            }
            ServerEvent::WinnerSelected { winner } => match winner {
                Some(winner) => self.winner_sequence(winner),
                None => self.refresh_gating(),
            },
            ServerEvent::GameEnd { winner } => match winner {
                Some(winner) => {
                    let winner = self.resolve_winner(winner);
                    self.winner_sequence(winner);
                }
                None => self.refresh_gating(),
            },
            ServerEvent::Timer { .. } => {
                self.render_timer();
                self.refresh_gating();
            }
            ServerEvent::BreakTimer { duration } => {
                self.render_timer();
                self.refresh_gating();
                self.scheduler.schedule(
                    EffectClass::BreakClear,
                    None,
                    Duration::from_secs(u64::from(duration)),
                );
            }
        }
    }

    /// Build a full [`Winner`] from a `game_end` reference, filling in
    /// roster fields when only a username was sent. When the roster is
    /// stale the popup still displays from the payload's own fields.
    fn resolve_winner(&self, winner: WinnerRef) -> Winner {
        match winner {
            WinnerRef::Record(winner) => winner,
            WinnerRef::Username(username) => {
                let seated = self
                    .store
                    .snapshot()
                    .players
                    .iter()
                    .find(|player| player.username == username);
                match seated {
                    Some(player) => Winner {
                        username: player.username.clone(),
                        emoji: player.emoji.clone(),
                        prize: player.prize.unwrap_or(0),
                        wallet_balance: None,
                    },
                    None => Winner {
                        username,
                        emoji: String::new(),
                        prize: 0,
                        wallet_balance: None,
                    },
                }
            }
        }
    }

    /// The winner presentation: seat highlight, status banner, wallet
    /// update, popup, and the deferred reload.
    fn winner_sequence(&mut self, winner: Winner) {
        // Seat distinction is a no-op when the local roster is stale.
        let seated = self
            .store
            .snapshot()
            .players
            .iter()
            .any(|player| player.username == winner.username);
        let highlight = seated.then(|| winner.username.clone());
        self.render_players(highlight.as_deref());

        self.view.set_text(
            targets::GAME_STATUS,
            &format!(
                "Winner: {} {} (Prize: ₹{})",
                winner.username, winner.emoji, winner.prize
            ),
        );
        if let Some(balance) = winner.wallet_balance {
            self.view
                .set_text(targets::WALLET_BALANCE, &format!("Your Balance: ₹{balance}"));
        }

        self.scheduler.schedule(
            EffectClass::WinnerPopup,
            Some(EffectPayload::WinnerPopup {
                username: winner.username,
                emoji: winner.emoji,
                prize: winner.prize,
            }),
            self.config.winner_popup_duration,
        );
        self.scheduler
            .schedule(EffectClass::DeferredReload, None, self.config.reload_delay);

        // Store already closed the round; gating goes dark until the next
        // game_status broadcast.
        self.refresh_gating();
    }

    fn handle_expiry(&mut self, expiry: EffectExpiry) {
        if !self.scheduler.acknowledge(expiry) {
            // Superseded between firing and dispatch.
            return;
        }
        match expiry.class {
            EffectClass::DeferredReload => {
                debug!("deferred reload firing");
                self.view.request_reload();
            }
            EffectClass::BreakClear => {
                if self.store.snapshot().status == GameStatus::Break {
                    self.store.set_status(GameStatus::Joining);
                    self.state
                        .status
                        .store(status_to_u8(GameStatus::Joining), Ordering::Release);
                }
                self.render_timer();
                self.refresh_gating();
            }
            // Visual effects need only the bookkeeping above.
            EffectClass::Toast | EffectClass::ExpansionNotice | EffectClass::WinnerPopup => {}
        }
    }

    /// Track the capacity tier across a roster change, raising the
    /// expansion banner exactly once per upward transition. Shrinking (a
    /// fresh round's reset) is silent.
    fn update_tier(&mut self) {
        let new_tier = tier_for(self.store.snapshot().players.len());
        if new_tier.max_players > self.current_tier.max_players {
            self.scheduler.schedule(
                EffectClass::ExpansionNotice,
                Some(EffectPayload::ExpansionNotice {
                    message: "Grid expanding...".into(),
                }),
                self.config.expansion_notice_duration,
            );
        }
        self.current_tier = new_tier;
    }

    /// Rebuild the grid and roster from the snapshot with a fresh random
    /// seat assignment. `highlight` marks one seat as the winner and fades
    /// all others.
    fn render_players(&self, highlight: Option<&str>) {
        let snapshot = self.store.snapshot();
        let tier = tier_for(snapshot.players.len());
        let mut rng = rand::rng();
        let seats = assign_seats(tier.total_cells, snapshot.players.len(), &mut rng);

        let mut cells: Vec<Option<SeatView>> = vec![None; tier.total_cells];
        for (index, (player, cell)) in snapshot.players.iter().zip(seats).enumerate() {
            let state = match highlight {
                None => SeatState::Normal,
                Some(name) if player.username == name => SeatState::Winner,
                Some(_) => SeatState::Faded,
            };
            if let Some(slot) = cells.get_mut(cell) {
                *slot = Some(SeatView {
                    username: player.username.clone(),
                    emoji: player.emoji.clone(),
                    color_index: index % PALETTE_SIZE,
                    state,
                });
            }
        }
        self.view.render_grid(&GridModel {
            dimension: tier.dimension,
            cells,
        });

        let roster: Vec<RosterEntry> = snapshot
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| RosterEntry {
                username: player.username.clone(),
                emoji: player.emoji.clone(),
                color_index: index % PALETTE_SIZE,
            })
            .collect();
        self.view.render_roster(&roster);
    }

    fn render_timer(&self) {
        let snapshot = self.store.snapshot();
        let is_break = snapshot.is_break();
        self.view.set_text(
            targets::COUNTDOWN,
            &timer_text::format(snapshot.timer_seconds, is_break),
        );
        self.view
            .toggle_class(targets::COUNTDOWN, BREAK_TIMER_CLASS, is_break);
    }

    /// Recompute the join-gating predicate and push it to the view and the
    /// shared state.
    fn refresh_gating(&self) {
        let snapshot = self.store.snapshot();
        let allowed = can_join(
            snapshot.status,
            snapshot.is_break(),
            snapshot.timer_seconds,
            self.config.join_cutoff_seconds,
        );
        let tooltip = if allowed {
            "Click to join the game".to_string()
        } else if snapshot.is_break() {
            "Game is in break".to_string()
        } else if snapshot.status != GameStatus::Joining {
            "Game is in progress".to_string()
        } else {
            format!(
                "Cannot join in the last {} seconds",
                self.config.join_cutoff_seconds
            )
        };
        self.view.set_join_enabled(allowed, &tooltip);
        self.state.can_join.store(allowed, Ordering::Release);
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
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
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock channel ────────────────────────────────────────────────

    /// A mock channel that records sent messages and replays scripted
    /// server events.
    struct MockChannel {
        /// Messages that `recv()` will yield in order.
        incoming: VecDeque<Option<std::result::Result<String, WheelClientError>>>,
        /// Recorded outgoing messages.
        sent: Arc<StdMutex<Vec<String>>>,
        /// Whether `close()` was called.
        closed: Arc<AtomicBool>,
    }

    impl MockChannel {
        fn new(
            incoming: Vec<Option<std::result::Result<String, WheelClientError>>>,
        ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let channel = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (channel, sent, closed)
        }
    }

    #[async_trait]
    impl EventChannel for MockChannel {
        async fn send(&mut self, message: String) -> Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, WheelClientError>> {
            if let Some(item) = self.incoming.pop_front() {
                // An explicit `None` entry signals a clean close;
                // `Some(result)` delivers the scripted event or error.
                item
            } else {
                // All scripted events delivered — hang forever so the
                // dispatch loop stays alive until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    // ── Recording view ──────────────────────────────────────────────

    /// Records view traffic for assertions.
    #[derive(Default)]
    struct RecordingView {
        log: StdMutex<Vec<String>>,
        join_enabled: AtomicBool,
        reloads: std::sync::atomic::AtomicUsize,
    }

    impl RecordingView {
        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn record(&self, entry: impl Into<String>) {
            self.log.lock().unwrap().push(entry.into());
        }

        fn join_enabled(&self) -> bool {
            self.join_enabled.load(Ordering::Acquire)
        }

        fn reloads(&self) -> usize {
            self.reloads.load(Ordering::Acquire)
        }
    }

    impl ViewBinding for RecordingView {
        fn set_text(&self, target: &str, text: &str) {
            self.record(format!("text {target}={text}"));
        }
        fn toggle_class(&self, target: &str, class: &str, on: bool) {
            self.record(format!("class {target}.{class}={on}"));
        }
        fn set_join_enabled(&self, enabled: bool, _tooltip: &str) {
            self.join_enabled.store(enabled, Ordering::Release);
            self.record(format!("join={enabled}"));
        }
        fn render_grid(&self, grid: &GridModel) {
            self.record(format!("grid dim={} occupied={}", grid.dimension, grid.occupied()));
        }
        fn render_roster(&self, roster: &[RosterEntry]) {
            self.record(format!("roster len={}", roster.len()));
        }
        fn show_effect(&self, class: EffectClass, _payload: &EffectPayload) {
            self.record(format!("show {class:?}"));
        }
        fn begin_effect_hide(&self, class: EffectClass) {
            self.record(format!("hide {class:?}"));
        }
        fn remove_effect(&self, class: EffectClass) {
            self.record(format!("remove {class:?}"));
        }
        fn request_reload(&self) {
            self.reloads.fetch_add(1, Ordering::AcqRel);
            self.record("reload");
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn player(name: &str, emoji: &str) -> crate::protocol::Player {
        crate::protocol::Player {
            username: name.to_string(),
            emoji: emoji.to_string(),
            prize: None,
        }
    }

    fn game_status_json(
        players: Vec<crate::protocol::Player>,
        status: GameStatus,
        timer: u32,
    ) -> String {
        serde_json::to_string(&ServerEvent::GameStatus {
            players: Some(players),
            status: Some(status),
            timer: Some(timer),
            is_break: Some(false),
        })
        .unwrap()
    }

    fn start_controller(
        incoming: Vec<Option<std::result::Result<String, WheelClientError>>>,
    ) -> (
        WheelHandle,
        Arc<RecordingView>,
        Arc<StdMutex<Vec<String>>>,
        Arc<AtomicBool>,
    ) {
        let (channel, sent, closed) = MockChannel::new(incoming);
        let view = Arc::new(RecordingView::default());
        let handle = WheelController::start(channel, SharedView(Arc::clone(&view)), WheelConfig::new());
        (handle, view, sent, closed)
    }

    /// Adapter so tests can keep a handle on the recording view while the
    /// controller owns its own `Arc` wrapper.
    struct SharedView(Arc<RecordingView>);

    impl ViewBinding for SharedView {
        fn set_text(&self, target: &str, text: &str) {
            self.0.set_text(target, text);
        }
        fn toggle_class(&self, target: &str, class: &str, on: bool) {
            self.0.toggle_class(target, class, on);
        }
        fn set_join_enabled(&self, enabled: bool, tooltip: &str) {
            self.0.set_join_enabled(enabled, tooltip);
        }
        fn render_grid(&self, grid: &GridModel) {
            self.0.render_grid(grid);
        }
        fn render_roster(&self, roster: &[RosterEntry]) {
            self.0.render_roster(roster);
        }
        fn show_effect(&self, class: EffectClass, payload: &EffectPayload) {
            self.0.show_effect(class, payload);
        }
        fn begin_effect_hide(&self, class: EffectClass) {
            self.0.begin_effect_hide(class);
        }
        fn remove_effect(&self, class: EffectClass) {
            self.0.remove_effect(class);
        }
        fn request_reload(&self) {
            self.0.request_reload();
        }
    }

    /// Let the dispatch loop drain everything queued so far.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn initial_state_renders_disabled_join() {
        let (mut handle, view, _sent, _closed) = start_controller(vec![]);
        settle().await;

        assert!(handle.is_connected());
        assert!(!handle.can_join());
        assert!(!view.join_enabled());
        assert_eq!(handle.status(), GameStatus::Joining);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn game_status_opens_the_join_window() {
        let (mut handle, view, _sent, _closed) = start_controller(vec![Some(Ok(
            game_status_json(vec![player("alice", "🎲")], GameStatus::Joining, 55),
        ))]);
        settle().await;

        assert!(handle.can_join());
        assert!(view.join_enabled());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn join_game_sends_request_and_disables_affordance() {
        let (mut handle, view, sent, _closed) = start_controller(vec![Some(Ok(
            game_status_json(vec![], GameStatus::Joining, 60),
        ))]);
        settle().await;

        handle.join_game().unwrap();
        settle().await;

        {
            let messages = sent.lock().unwrap();
            let last: ClientRequest = serde_json::from_str(messages.last().unwrap()).unwrap();
            assert_eq!(last, ClientRequest::JoinGame);
        }
        // Optimistically disabled until the server answers.
        assert!(!view.join_enabled());
        assert!(!handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn join_game_is_rejected_while_window_closed() {
        let (mut handle, _view, _sent, _closed) = start_controller(vec![]);
        settle().await;

        let result = handle.join_game();
        assert!(matches!(result, Err(WheelClientError::JoinNotOpen)));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_join_reenables_the_affordance() {
        let rejection = serde_json::to_string(&ServerEvent::PlayerJoined {
            success: false,
            players: None,
            new_player: None,
            message: Some("Insufficient balance".into()),
            player_count: None,
        })
        .unwrap();
        let (mut handle, view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
            Some(Ok(rejection)),
        ]);
        settle().await;

        // The rejection toast fired and gating was recomputed from the
        // unchanged snapshot, so joining is open again.
        assert!(view.entries().iter().any(|e| e == "show Toast"));
        assert!(view.join_enabled());
        assert!(handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn timer_cutoff_closes_the_join_window() {
        let tick = |time: u32| {
            serde_json::to_string(&ServerEvent::Timer {
                time,
                is_break: None,
            })
            .unwrap()
        };
        let (handle, _view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
            Some(Ok(tick(11))),
        ]);
        settle().await;
        assert!(handle.can_join());
        drop(handle);

        // Inside the final 10 seconds joining is blocked even though the
        // round is nominally still open.
        let (mut handle, _view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
            Some(Ok(tick(10))),
        ]);
        settle().await;
        assert!(!handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn break_timer_blocks_then_reopens_joining() {
        let break_json = serde_json::to_string(&ServerEvent::BreakTimer { duration: 30 }).unwrap();
        let (mut handle, _view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
            Some(Ok(break_json)),
        ]);
        settle().await;

        assert_eq!(handle.status(), GameStatus::Break);
        assert!(!handle.can_join());

        // Once the break duration elapses the window reopens locally.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(handle.status(), GameStatus::Joining);
        assert!(handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn channel_error_disables_joins_and_surfaces_reason() {
        let (mut handle, view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
            Some(Err(WheelClientError::ChannelReceive("boom".into()))),
        ]);
        settle().await;

        assert!(!handle.is_connected());
        assert!(!handle.can_join());
        assert!(view
            .entries()
            .iter()
            .any(|e| e.starts_with("text game-status=Connection lost") && e.contains("boom")));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn clean_channel_close_tears_down() {
        let (mut handle, _view, _sent, _closed) = start_controller(vec![None]);
        settle().await;

        assert!(!handle.is_connected());
        let result = handle.join_game();
        assert!(matches!(result, Err(WheelClientError::NotConnected)));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_the_channel() {
        let (mut handle, _view, _sent, closed) = start_controller(vec![]);
        settle().await;

        handle.shutdown().await;
        assert!(!handle.is_connected());
        assert!(closed.load(Ordering::Relaxed));
    }

    #[tokio::test(start_paused = true)]
    async fn double_shutdown_does_not_panic() {
        let (mut handle, _view, _sent, _closed) = start_controller(vec![]);
        settle().await;

        handle.shutdown().await;
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_without_explicit_shutdown() {
        let (handle, _view, _sent, _closed) = start_controller(vec![]);
        settle().await;

        // Dropping aborts the dispatch loop; nothing should hang or panic.
        drop(handle);
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_events_are_skipped() {
        let (mut handle, _view, _sent, _closed) = start_controller(vec![
            Some(Ok("{not json".into())),
            Some(Ok(r#"{"type":"unknown_event","data":{}}"#.into())),
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 60))),
        ]);
        settle().await;

        // The garbage was dropped and the valid broadcast still landed.
        assert!(handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn winner_reload_fires_after_the_delay() {
        let winner_json = serde_json::to_string(&ServerEvent::WinnerSelected {
            winner: Some(Winner {
                username: "alice".into(),
                emoji: "🎲".into(),
                prize: 500,
                wallet_balance: None,
            }),
        })
        .unwrap();
        let (mut handle, view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(
                vec![player("alice", "🎲")],
                GameStatus::Joining,
                55,
            ))),
            Some(Ok(winner_json)),
        ]);
        settle().await;

        assert!(!handle.can_join());
        assert!(view.entries().iter().any(|e| e == "show WinnerPopup"));
        assert_eq!(view.reloads(), 0);

        tokio::time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(view.reloads(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn new_round_cancels_the_pending_reload() {
        let winner_json = serde_json::to_string(&ServerEvent::WinnerSelected {
            winner: Some(Winner {
                username: "alice".into(),
                emoji: "🎲".into(),
                prize: 500,
                wallet_balance: None,
            }),
        })
        .unwrap();
        let (mut handle, view, _sent, _closed) = start_controller(vec![
            Some(Ok(game_status_json(
                vec![player("alice", "🎲")],
                GameStatus::Joining,
                55,
            ))),
            Some(Ok(winner_json)),
            // A fresh round arrives before the reload deadline.
            Some(Ok(game_status_json(vec![], GameStatus::Joining, 300))),
        ]);
        settle().await;

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(view.reloads(), 0, "stale reload must not race a fresh round");
        assert!(handle.can_join());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn config_defaults() {
        let config = WheelConfig::new();
        assert_eq!(config.join_cutoff_seconds, 10);
        assert_eq!(config.toast_duration, Duration::from_millis(3000));
        assert_eq!(config.expansion_notice_duration, Duration::from_millis(2000));
        assert_eq!(config.winner_popup_duration, Duration::from_millis(5000));
        assert_eq!(config.reload_delay, Duration::from_millis(6000));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn config_builder_methods() {
        let config = WheelConfig::new()
            .with_join_cutoff_seconds(5)
            .with_reload_delay(Duration::from_secs(10))
            .with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(config.join_cutoff_seconds, 5);
        assert_eq!(config.reload_delay, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn debug_impl_for_handle() {
        let (mut handle, _view, _sent, _closed) = start_controller(vec![]);
        settle().await;

        let debug_str = format!("{handle:?}");
        assert!(debug_str.contains("WheelHandle"));
        assert!(debug_str.contains("connected"));

        handle.shutdown().await;
    }
}
