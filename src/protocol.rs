//! Wire types for the wheel game's push channel.
//!
//! Every type in this module mirrors the JSON payloads emitted by the game
//! server. Events travel as a tagged envelope (`{"type": ..., "data": ...}`)
//! over any text-message channel. Key properties:
//!
//! - Every payload field carries `#[serde(default)]` — the server is allowed
//!   to send partial events, and a missing field must never fail the parse.
//! - `game_end` may carry either a bare winner username or a full winner
//!   record; [`WinnerRef`] absorbs both forms.

use serde::{Deserialize, Serialize};

/// Number of player colors defined by the presentation palette.
///
/// A player's color is `roster_index % PALETTE_SIZE`, so colors repeat once
/// the roster outgrows the palette.
pub const PALETTE_SIZE: usize = 12;

// ── Enums ───────────────────────────────────────────────────────────

/// Phase of the current round, as broadcast by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The round is open: players may request to join.
    #[default]
    Joining,
    /// The round is running; the roster is locked.
    InProgress,
    /// Between rounds; joining is blocked until the next round opens.
    Break,
    /// Terminal: the server will start no further rounds.
    Ended,
}

// ── Structs ─────────────────────────────────────────────────────────

/// A seated player as known to the server.
///
/// Identity is `username` (unique within a round). Roster order is the
/// server's insertion order and determines the player's palette color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub username: String,
    #[serde(default)]
    pub emoji: String,
    /// Prize amount, present only on winner records.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prize: Option<u64>,
}

/// Terminal winner payload. Not part of the game snapshot; drives the
/// one-shot winner popup and the deferred reload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Winner {
    pub username: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub prize: u64,
    /// Updated wallet balance, sent only to the winning client.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wallet_balance: Option<u64>,
}

/// Winner reference as found in `game_end` events: either a bare username
/// (resolved against the local roster) or a full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WinnerRef {
    Record(Winner),
    Username(String),
}

impl WinnerRef {
    /// The username this reference points at, whichever form it takes.
    pub fn username(&self) -> &str {
        match self {
            WinnerRef::Record(winner) => &winner.username,
            WinnerRef::Username(name) => name,
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Events pushed from server to client.
///
/// All payload fields are optional on the wire; consumers default missing
/// fields to the previous snapshot's values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Authoritative full-state broadcast. Replaces the local snapshot
    /// wholesale regardless of sequence gaps.
    GameStatus {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        players: Option<Vec<Player>>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status: Option<GameStatus>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timer: Option<u32>,
        #[serde(rename = "isBreak", skip_serializing_if = "Option::is_none", default)]
        is_break: Option<bool>,
    },
    /// Broadcast after a join attempt. `success: false` is the server's
    /// rejection of this client's own `join_game` request.
    PlayerJoined {
        #[serde(default)]
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        players: Option<Vec<Player>>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        new_player: Option<Player>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        player_count: Option<usize>,
    },
    /// A winner has been drawn for the current round.
    WinnerSelected {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        winner: Option<Winner>,
    },
    /// The round ended. The winner may be a bare username.
    GameEnd {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        winner: Option<WinnerRef>,
    },
    /// Once-per-second countdown tick. Affects timer display and join
    /// gating only; never replaces the snapshot.
    Timer {
        #[serde(default)]
        time: u32,
        #[serde(rename = "isBreak", skip_serializing_if = "Option::is_none", default)]
        is_break: Option<bool>,
    },
    /// Break between rounds: joining is blocked for `duration` seconds.
    BreakTimer {
        #[serde(default)]
        duration: u32,
    },
}

/// Requests sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Attempt to join the current round. Fire-and-forget: the server's
    /// acknowledgement arrives as a `player_joined` event, with
    /// `success: false` on rejection.
    JoinGame,
}
