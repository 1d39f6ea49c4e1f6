//! Seat grid sizing and randomized seat assignment.
//!
//! The grid grows through a fixed table of capacity tiers as the roster
//! grows. Seat placement is cosmetic: a fresh random, collision-free
//! assignment is computed for every render and never persisted.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

/// A grid size selected for a given roster size.
///
/// Tiers are totally ordered by `max_players`; `total_cells` is
/// monotonically non-decreasing along that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityTier {
    /// Grid dimension (the grid is `dimension × dimension`).
    pub dimension: u8,
    /// Total cell count (`dimension²`).
    pub total_cells: usize,
    /// Largest roster this tier seats without overflow.
    pub max_players: usize,
}

/// The largest configured tier, used as the overflow fallback.
const LARGEST_TIER: CapacityTier = CapacityTier {
    dimension: 4,
    total_cells: 16,
    max_players: 16,
};

/// Ordered tier table: smallest tier first.
const TIERS: [CapacityTier; 3] = [
    CapacityTier {
        dimension: 2,
        total_cells: 4,
        max_players: 3,
    },
    CapacityTier {
        dimension: 3,
        total_cells: 9,
        max_players: 8,
    },
    LARGEST_TIER,
];

/// Select the smallest tier that seats `player_count` players.
///
/// Counts above the largest tier's capacity fall back to the largest tier
/// with a logged warning: surplus players stay on the roster list but
/// receive no seat.
pub fn tier_for(player_count: usize) -> CapacityTier {
    for tier in TIERS {
        if player_count <= tier.max_players {
            return tier;
        }
    }
    warn!(
        player_count,
        capacity = LARGEST_TIER.max_players,
        "roster exceeds largest capacity tier; surplus players are unseated"
    );
    LARGEST_TIER
}

/// Produce a uniformly-random injective seat assignment: element `i` is the
/// cell index of player `i`.
///
/// Shuffle-and-take: a permutation of all cell indices is shuffled once and
/// the first `player_count` entries are kept, so the assignment is
/// collision-free by construction and completes in bounded time even when
/// `player_count` equals (or exceeds) `total_cells`. Overflowing players are
/// simply left without a seat.
pub fn assign_seats<R: Rng + ?Sized>(
    total_cells: usize,
    player_count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut cells: Vec<usize> = (0..total_cells).collect();
    cells.shuffle(rng);
    cells.truncate(player_count.min(total_cells));
    cells
}
