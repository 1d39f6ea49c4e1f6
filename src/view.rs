//! View-binding capability and the display models handed to it.
//!
//! The core never touches rendering primitives directly: it computes display
//! values ([`GridModel`], [`RosterEntry`], effect payloads, plain strings)
//! and hands them to an injected [`ViewBinding`]. Implementations bind these
//! calls to an actual surface (DOM, TUI, test recorder). A missing render
//! target must be a silent no-op at every call site — the core treats the
//! view as write-only and infallible.

use crate::effects::{EffectClass, EffectPayload};

// ── Render targets ──────────────────────────────────────────────────

/// Well-known render target ids used by the controller.
pub mod targets {
    /// Countdown / break timer text element.
    pub const COUNTDOWN: &str = "countdown";
    /// Free-form status line (connection state, join feedback, winner banner).
    pub const GAME_STATUS: &str = "game-status";
    /// Wallet balance line, updated when a winner payload carries one.
    pub const WALLET_BALANCE: &str = "wallet-balance";
}

/// CSS-style class toggled on the countdown element during breaks.
pub const BREAK_TIMER_CLASS: &str = "break-timer";

// ── Display models ──────────────────────────────────────────────────

/// Visual state of an occupied seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState {
    Normal,
    /// The winning seat after a winner announcement.
    Winner,
    /// Every non-winning seat after a winner announcement.
    Faded,
}

/// An occupied cell in the seat grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    pub username: String,
    pub emoji: String,
    /// Palette slot, `roster_index % PALETTE_SIZE`.
    pub color_index: usize,
    pub state: SeatState,
}

/// The complete seat grid for one render: `dimension²` cells, each either
/// empty or occupied. Rebuilt from scratch on every roster change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    pub dimension: u8,
    pub cells: Vec<Option<SeatView>>,
}

impl GridModel {
    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

/// One line in the players side list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub username: String,
    pub emoji: String,
    pub color_index: usize,
}

// ── Capability trait ────────────────────────────────────────────────

/// Rendering capability injected into the controller.
///
/// All methods are infallible from the core's perspective: implementations
/// must swallow missing targets rather than report them. The view is
/// write-only — it never reads back into game state.
pub trait ViewBinding: Send + Sync + 'static {
    /// Set the text content of a target element (see [`targets`]).
    fn set_text(&self, target: &str, text: &str);

    /// Toggle a class on a target element.
    fn toggle_class(&self, target: &str, class: &str, on: bool);

    /// Enable or disable the join affordance, with an explanatory tooltip.
    fn set_join_enabled(&self, enabled: bool, tooltip: &str);

    /// Replace the seat grid with a freshly computed model.
    fn render_grid(&self, grid: &GridModel);

    /// Replace the players side list.
    fn render_roster(&self, roster: &[RosterEntry]);

    /// Make a transient effect element visible. Called synchronously when
    /// the effect is scheduled.
    fn show_effect(&self, class: EffectClass, payload: &EffectPayload);

    /// Start the effect's exit transition (e.g. drop a `show` class).
    fn begin_effect_hide(&self, class: EffectClass);

    /// Remove the effect element entirely.
    fn remove_effect(&self, class: EffectClass);

    /// Force a full page/state refresh. Terminal: issued only by the
    /// deferred-reload effect after a winner announcement.
    fn request_reload(&self);
}
