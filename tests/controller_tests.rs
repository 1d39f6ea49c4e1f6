#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style controller tests for the wheel client.
//!
//! Uses the shared `MockChannel` and `RecordingView` from `tests/common`
//! to script server events and verify what the controller renders: grid
//! and roster updates, join gating, timer text, and the scheduled effects.

mod common;

use std::time::Duration;

use wheel_client::protocol::ServerEvent;
use wheel_client::{
    EffectClass, EffectPayload, GameStatus, SeatState, ToastKind, WheelClientError, WheelConfig,
    WheelController, WheelHandle,
};

use common::{
    break_timer_json, game_end_username_json, game_status_json, join_rejected_json, player,
    player_joined_json, roster, timer_json, winner_selected_json, MockChannel, RecordingView,
};

// ════════════════════════════════════════════════════════════════════
// Helper: start a controller with scripted events
// ════════════════════════════════════════════════════════════════════

/// Start a controller with the given scripted server events and the default
/// configuration.
#[allow(clippy::type_complexity)]
fn start_controller(
    incoming: Vec<Option<Result<String, WheelClientError>>>,
) -> (
    WheelHandle,
    RecordingView,
    std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    std::sync::Arc<std::sync::atomic::AtomicBool>,
) {
    let (channel, sent, closed) = MockChannel::new(incoming);
    let view = RecordingView::new();
    let handle = WheelController::start(channel, view.clone(), WheelConfig::new());
    (handle, view, sent, closed)
}

/// Let the dispatch loop drain everything queued so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ════════════════════════════════════════════════════════════════════
// Full round: roster render, winner sequence, deferred reload
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn full_round_renders_grid_then_winner_then_reload() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(3), GameStatus::Joining, 55))),
        Some(Ok(winner_selected_json("p1", 500, Some(1200)))),
    ]);
    settle().await;

    // Three players fit the smallest grid with one cell left empty.
    let grid = view.grid().expect("grid rendered");
    assert_eq!(grid.dimension, 2);
    assert_eq!(grid.cells.len(), 4);
    assert_eq!(grid.occupied(), 3);
    assert_eq!(view.roster().len(), 3);
    assert_eq!(view.text("countdown").as_deref(), Some("0:55"));

    // Winner presentation: seat highlight, banner, wallet, popup.
    let winner_seat = grid
        .cells
        .iter()
        .flatten()
        .find(|seat| seat.username == "p1")
        .expect("winner is seated");
    assert_eq!(winner_seat.state, SeatState::Winner);
    for seat in grid.cells.iter().flatten() {
        if seat.username != "p1" {
            assert_eq!(seat.state, SeatState::Faded);
        }
    }
    assert_eq!(view.shown_count(EffectClass::WinnerPopup), 1);
    assert!(view
        .text("game-status")
        .expect("status banner set")
        .starts_with("Winner: p1"));
    assert_eq!(
        view.text("wallet-balance").as_deref(),
        Some("Your Balance: ₹1200")
    );

    // The round is closed; joining stays dark until the next broadcast.
    assert!(!view.join_enabled());
    assert!(!handle.can_join());

    // The forced reload fires only after its full delay.
    assert_eq!(view.reloads(), 0);
    tokio::time::sleep(Duration::from_millis(6500)).await;
    assert_eq!(view.reloads(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn fresh_round_cancels_the_pending_reload() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(1), GameStatus::Joining, 55))),
        Some(Ok(winner_selected_json("p0", 100, None))),
        Some(Ok(game_status_json(roster(0), GameStatus::Joining, 300))),
    ]);
    settle().await;

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(view.reloads(), 0, "stale reload must not hit the new round");
    assert!(view.join_enabled());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn game_end_with_bare_username_resolves_against_roster() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(4), GameStatus::Joining, 55))),
        Some(Ok(game_end_username_json("p2"))),
    ]);
    settle().await;

    // The roster entry supplies the emoji the payload lacked.
    let banner = view.text("game-status").expect("status banner set");
    assert!(banner.starts_with("Winner: p2 \u{1F3B2}"), "banner: {banner}");
    assert_eq!(view.shown_count(EffectClass::WinnerPopup), 1);

    let grid = view.grid().expect("grid rendered");
    let winner_seat = grid
        .cells
        .iter()
        .flatten()
        .find(|seat| seat.username == "p2")
        .expect("winner is seated");
    assert_eq!(winner_seat.state, SeatState::Winner);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_winner_skips_the_seat_highlight() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(2), GameStatus::Joining, 55))),
        Some(Ok(winner_selected_json("ghost", 500, None))),
    ]);
    settle().await;

    // The popup still announces from the payload's own fields, but no seat
    // is highlighted and nothing fades.
    assert_eq!(view.shown_count(EffectClass::WinnerPopup), 1);
    let grid = view.grid().expect("grid rendered");
    for seat in grid.cells.iter().flatten() {
        assert_eq!(seat.state, SeatState::Normal);
    }

    handle.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Grid tiers
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn expansion_notice_fires_once_per_tier_change() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(3), GameStatus::Joining, 55))),
        // Fourth player: 2×2 no longer fits, the grid expands to 3×3.
        Some(Ok(player_joined_json(
            roster(4),
            player("p3"),
            "p3 joined the game",
        ))),
        // Fifth player: still 3×3, no second notice.
        Some(Ok(player_joined_json(
            roster(5),
            player("p4"),
            "p4 joined the game",
        ))),
    ]);
    settle().await;

    assert_eq!(view.shown_count(EffectClass::ExpansionNotice), 1);
    let grid = view.grid().expect("grid rendered");
    assert_eq!(grid.dimension, 3);
    assert_eq!(grid.occupied(), 5);

    // Each successful join also raised a toast prefixed with the player's
    // emoji.
    let toasts: Vec<_> = view
        .shown()
        .into_iter()
        .filter_map(|(class, payload)| match (class, payload) {
            (EffectClass::Toast, EffectPayload::Toast { message, kind }) => Some((message, kind)),
            _ => None,
        })
        .collect();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].0, "\u{1F3B2} p3 joined the game");
    assert_eq!(toasts[0].1, ToastKind::Success);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn oversized_roster_is_capped_at_the_largest_grid() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![Some(Ok(game_status_json(
        roster(17),
        GameStatus::Joining,
        55,
    )))]);
    settle().await;

    // Seventeen players overflow the 4×4 grid: sixteen get seats, the
    // roster list still shows everyone.
    let grid = view.grid().expect("grid rendered");
    assert_eq!(grid.dimension, 4);
    assert_eq!(grid.occupied(), 16);
    assert_eq!(view.roster().len(), 17);

    handle.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Join gating and the join request
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn join_request_wire_format() {
    let (mut handle, view, sent, _closed) = start_controller(vec![Some(Ok(game_status_json(
        roster(0),
        GameStatus::Joining,
        60,
    )))]);
    settle().await;
    assert!(view.join_enabled());
    assert_eq!(view.join_tooltip(), "Click to join the game");

    handle.join_game().expect("join window is open");
    settle().await;

    {
        let messages = sent.lock().unwrap();
        assert_eq!(messages.last().map(String::as_str), Some(r#"{"type":"join_game"}"#));
    }
    // Optimistically disabled with pending feedback until the server answers.
    assert!(!view.join_enabled());
    assert_eq!(view.text("game-status").as_deref(), Some("Joining game..."));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_join_restores_the_affordance() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(0), GameStatus::Joining, 60))),
        Some(Ok(join_rejected_json("Insufficient balance"))),
    ]);
    settle().await;

    let toasts: Vec<_> = view
        .shown()
        .into_iter()
        .filter_map(|(class, payload)| match (class, payload) {
            (EffectClass::Toast, EffectPayload::Toast { message, kind }) => Some((message, kind)),
            _ => None,
        })
        .collect();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].0, "Insufficient balance");
    assert_eq!(toasts[0].1, ToastKind::Error);
    assert_eq!(
        view.text("game-status").as_deref(),
        Some("Insufficient balance")
    );

    // The snapshot is unchanged, so gating recomputes to open.
    assert!(view.join_enabled());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cutoff_tooltip_explains_the_closed_window() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(0), GameStatus::Joining, 60))),
        Some(Ok(timer_json(8))),
    ]);
    settle().await;

    assert!(!view.join_enabled());
    assert_eq!(view.join_tooltip(), "Cannot join in the last 10 seconds");
    assert!(matches!(
        handle.join_game(),
        Err(WheelClientError::JoinNotOpen)
    ));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn in_progress_round_blocks_joins() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![Some(Ok(game_status_json(
        roster(4),
        GameStatus::InProgress,
        40,
    )))]);
    settle().await;

    assert!(!view.join_enabled());
    assert_eq!(view.join_tooltip(), "Game is in progress");

    handle.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Timer and break display
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn countdown_text_tracks_timer_ticks() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(0), GameStatus::Joining, 75))),
        Some(Ok(timer_json(65))),
    ]);
    settle().await;

    assert_eq!(view.text("countdown").as_deref(), Some("1:05"));
    assert!(!view.has_class("countdown", "break-timer"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn break_display_and_local_clear() {
    let break_tick = serde_json::to_string(&ServerEvent::Timer {
        time: 29,
        is_break: Some(true),
    })
    .expect("timer serialization");
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(0), GameStatus::Joining, 60))),
        Some(Ok(break_timer_json(30))),
        Some(Ok(break_tick)),
    ]);
    settle().await;

    // During the break the countdown switches to the break wording and
    // joining is blocked.
    assert_eq!(
        view.text("countdown").as_deref(),
        Some("Next game starts in: 29s")
    );
    assert!(view.has_class("countdown", "break-timer"));
    assert!(!view.join_enabled());
    assert_eq!(view.join_tooltip(), "Game is in break");
    assert_eq!(handle.status(), GameStatus::Break);

    // Once the announced duration elapses the break clears locally even if
    // the server stays quiet.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(handle.status(), GameStatus::Joining);
    assert!(view.join_enabled());
    assert!(!view.has_class("countdown", "break-timer"));
    assert_eq!(view.text("countdown").as_deref(), Some("0:29"));

    handle.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Connection lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn channel_error_surfaces_and_disables_joins() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(2), GameStatus::Joining, 60))),
        Some(Err(WheelClientError::ChannelReceive("reset by peer".into()))),
    ]);
    settle().await;

    assert!(!handle.is_connected());
    assert!(!view.join_enabled());
    assert_eq!(view.join_tooltip(), "Not connected");
    let status = view.text("game-status").expect("status text set");
    assert!(status.starts_with("Connection lost"), "status: {status}");
    assert!(status.contains("reset by peer"), "status: {status}");

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_outstanding_effects() {
    let (mut handle, view, _sent, _closed) = start_controller(vec![
        Some(Ok(game_status_json(roster(1), GameStatus::Joining, 55))),
        Some(Ok(winner_selected_json("p0", 100, None))),
        Some(Err(WheelClientError::ChannelReceive("gone".into()))),
    ]);
    settle().await;

    // The popup was shown, but both it and the pending reload died with the
    // connection.
    assert_eq!(view.shown_count(EffectClass::WinnerPopup), 1);
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(!view.effect_live(EffectClass::WinnerPopup));
    assert_eq!(view.reloads(), 0);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_the_channel() {
    let (mut handle, _view, _sent, closed) = start_controller(vec![]);
    settle().await;

    handle.shutdown().await;
    assert!(closed.load(std::sync::atomic::Ordering::Relaxed));
    assert!(!handle.is_connected());
}

#[tokio::test(start_paused = true)]
async fn clean_close_rejects_further_joins() {
    let (mut handle, _view, _sent, _closed) = start_controller(vec![None]);
    settle().await;

    assert!(!handle.is_connected());
    assert!(matches!(
        handle.join_game(),
        Err(WheelClientError::NotConnected)
    ));

    handle.shutdown().await;
}
