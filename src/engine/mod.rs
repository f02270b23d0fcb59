//! Engine Orchestration
//!
//! Ties the pure game logic to the transactional store: matchmaking,
//! move submission with bounded optimistic retries, subscriptions, and
//! the deferred round-reset timer.

use std::time::Duration;

use crate::game::session::MatchRules;

pub mod service;

pub use service::{GameEngine, GameWatcher, MatchWatcher};

/// Engine tunables.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Match format.
    pub rules: MatchRules,
    /// How long a resolved round drains before move state is cleared.
    pub round_reset_delay: Duration,
    /// Optimistic commits attempted before surfacing `MatchConflict`.
    pub max_commit_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules: MatchRules::default(),
            round_reset_delay: Duration::from_millis(2500),
            max_commit_retries: 5,
        }
    }
}

/// Errors surfaced by engine operations.
///
/// Every kind carries its own user-facing message; `MatchConflict` is the
/// only one that should prompt a manual retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// No session exists for the id (or the caller occupies no slot in it).
    #[error("game not found")]
    InvalidSession,

    /// The session is outside its active window.
    #[error("this game is not accepting moves")]
    GameNotActive,

    /// The caller already moved this round.
    #[error("you already played this round")]
    DuplicateMove,

    /// The round resolved and is draining before reset.
    #[error("the round is wrapping up, wait for the next one")]
    RoundLocked,

    /// Concurrent transactions kept conflicting past the retry bound.
    #[error("the game is busy right now, please try again")]
    MatchConflict,

    /// Caller identity does not match the acting player.
    #[error("you are not signed in as that player")]
    Unauthorized,
}
