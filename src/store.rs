//! Local game state and the event reducer.
//!
//! [`GameStateStore`] holds the authoritative-as-known snapshot and applies
//! incoming [`ServerEvent`]s to produce the next one, reporting which fields
//! changed. The reducer is total: partial events fall back to the previous
//! snapshot's values, and a missing roster never clears the local roster.
//!
//! Break is modelled as the first-class [`GameStatus::Break`] status rather
//! than a parallel boolean, so the two can no longer desynchronize; events
//! that carry a separate `isBreak: true` flag are normalized into the status.

use crate::protocol::{GameStatus, Player, ServerEvent};

/// The complete locally-held view of current game state.
///
/// Replaced wholesale by `game_status` events, patched (roster only) by
/// `player_joined` events, and timer-adjusted by `timer` ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    /// Seated players in server order (unique usernames).
    pub players: Vec<Player>,
    /// Phase of the current round.
    pub status: GameStatus,
    /// Seconds remaining on the server's countdown, as last reported.
    pub timer_seconds: u32,
}

impl GameSnapshot {
    /// Whether the game is between rounds. Derived solely from status.
    pub fn is_break(&self) -> bool {
        self.status == GameStatus::Break
    }
}

/// Flags reporting which snapshot fields an event changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub players: bool,
    pub status: bool,
    pub timer: bool,
}

impl ChangeSet {
    /// Whether anything changed at all.
    pub fn any(&self) -> bool {
        self.players || self.status || self.timer
    }
}

/// Join-gating predicate: joining is allowed only while the round is open,
/// not in a break, and outside the final `cutoff` seconds before round
/// start.
pub fn can_join(status: GameStatus, is_break: bool, timer_seconds: u32, cutoff: u32) -> bool {
    status == GameStatus::Joining && !is_break && timer_seconds > cutoff
}

/// Owns the [`GameSnapshot`] and applies server events to it.
///
/// The store is exclusively mutated on the controller's dispatch task; the
/// view layer only ever receives values computed from it.
#[derive(Debug, Default)]
pub struct GameStateStore {
    snapshot: GameSnapshot,
}

impl GameStateStore {
    /// Create a store with the initial snapshot: empty roster, `Joining`,
    /// zero seconds on the clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    /// Apply a server event and report which fields changed.
    ///
    /// Total over all event shapes: unknown combinations of missing fields
    /// merge defensively against the previous snapshot.
    pub fn apply(&mut self, event: &ServerEvent) -> ChangeSet {
        match event {
            ServerEvent::GameStatus {
                players,
                status,
                timer,
                is_break,
            } => {
                let mut changes = ChangeSet::default();
                if let Some(players) = players {
                    if *players != self.snapshot.players {
                        self.snapshot.players = players.clone();
                        changes.players = true;
                    }
                }
                let mut next_status = (*status).unwrap_or(self.snapshot.status);
                // A bare isBreak flag wins over a stale status field.
                if *is_break == Some(true) {
                    next_status = GameStatus::Break;
                }
                changes.status = self.set_status(next_status);
                if let Some(timer) = timer {
                    changes.timer = self.set_timer(*timer);
                }
                changes
            }
            ServerEvent::PlayerJoined {
                success, players, ..
            } => {
                let mut changes = ChangeSet::default();
                if *success {
                    if let Some(players) = players {
                        if *players != self.snapshot.players {
                            self.snapshot.players = players.clone();
                            changes.players = true;
                        }
                    }
                }
                changes
            }
            ServerEvent::Timer { time, is_break } => {
                let mut changes = ChangeSet {
                    timer: self.set_timer(*time),
                    ..ChangeSet::default()
                };
                if *is_break == Some(true) {
                    changes.status = self.set_status(GameStatus::Break);
                }
                changes
            }
            ServerEvent::BreakTimer { .. } => ChangeSet {
                status: self.set_status(GameStatus::Break),
                ..ChangeSet::default()
            },
            // The round is over either way; joins stay closed until the
            // next round's game_status arrives.
            ServerEvent::WinnerSelected { .. } | ServerEvent::GameEnd { .. } => ChangeSet {
                status: self.set_status(GameStatus::Break),
                ..ChangeSet::default()
            },
        }
    }

    /// Force the status (controller-side transitions such as a break
    /// elapsing locally). Returns whether it changed.
    pub fn set_status(&mut self, status: GameStatus) -> bool {
        if self.snapshot.status == status {
            return false;
        }
        self.snapshot.status = status;
        true
    }

    fn set_timer(&mut self, timer_seconds: u32) -> bool {
        if self.snapshot.timer_seconds == timer_seconds {
            return false;
        }
        self.snapshot.timer_seconds = timer_seconds;
        true
    }
}
