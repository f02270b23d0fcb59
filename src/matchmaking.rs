//! Matchmaking Records & Opponent Selection
//!
//! Queue-side records the store persists (waiting entries, one-shot match
//! assignments, player profiles) and the pure selection rule that pairs a
//! joining player with the longest-waiting opponent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::session::{GameId, PlayerId};

/// A queued player awaiting pairing.
///
/// Created on join, deleted the instant a match forms — either by the
/// owner finding an opponent, or by a later joiner matching the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingEntry {
    /// Queued player.
    pub player: PlayerId,
    /// When the player joined the queue.
    pub joined_at: DateTime<Utc>,
}

/// One-shot pointer from a queued player to their newly formed session.
///
/// Written atomically with session creation, deleted once the owning
/// client observes it and transitions into the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAssignment {
    /// The session the player was paired into.
    pub game: GameId,
}

/// Per-player profile record.
///
/// Matchmaking reads it for the display name; game completion increments
/// `games_played` for both participants in the completing transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Owning player.
    pub player: PlayerId,
    /// Name shown to the opponent.
    pub display_name: String,
    /// Completed games, win or lose.
    pub games_played: u32,
}

impl PlayerProfile {
    /// A fresh profile with zero games.
    pub fn new(player: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            player,
            display_name: display_name.into(),
            games_played: 0,
        }
    }
}

/// Pick the opponent for `joiner` from the current waiting set.
///
/// Excludes the joiner's own entry, then selects the earliest `joined_at`;
/// equal timestamps break ties by lowest player id so selection is total
/// and deterministic. Returns `None` when nobody else is waiting.
pub fn select_opponent(waiting: &[WaitingEntry], joiner: PlayerId) -> Option<&WaitingEntry> {
    waiting
        .iter()
        .filter(|entry| entry.player != joiner)
        .min_by_key(|entry| (entry.joined_at, entry.player))
}

// =============================================================================
// TESTS
// =============================================================================
