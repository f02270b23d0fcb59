//! Game Session State Machine
//!
//! One session owns a full match lifecycle: rounds, scores, tie-breaker
//! escalation, completion. Mutation is pure — the engine decides *when*
//! to apply a move, this module decides *what* it does to the state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::moves::{resolve, Move, RoundOutcome};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique player identifier.
///
/// Implements Ord for deterministic BTreeMap ordering and for the
/// matchmaking tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form for logging and display-name fallback.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form for logging.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// SLOTS
// =============================================================================

/// One of the two fixed player positions within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// First fixed position, assigned to the longer-waiting player.
    A,
    /// Second fixed position, assigned to the joiner.
    B,
}

/// State of a single player slot. Roles are assigned at session creation
/// and immutable thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSlot {
    /// Owning player.
    pub player: PlayerId,

    /// Display name captured from the player's profile at pairing time.
    pub display_name: String,

    /// Rounds won so far.
    pub score: u32,

    /// Move submitted for the current round, if any.
    ///
    /// Non-null only between this player's submission and the round reset.
    #[serde(rename = "move")]
    pub submitted: Option<Move>,
}

impl PlayerSlot {
    fn new(player: PlayerId, display_name: String) -> Self {
        Self {
            player,
            display_name,
            score: 0,
            submitted: None,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Lifecycle state of a session. `Complete` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Both slots not yet populated. In practice matchmaking creates
    /// sessions directly in `Active`.
    Waiting,
    /// Match in progress, moves accepted.
    Active,
    /// Match decided; `winner` is set.
    Complete,
}

/// Tunable match format.
#[derive(Clone, Copy, Debug)]
pub struct MatchRules {
    /// Regulation rounds before the score comparison. Tied scores after
    /// regulation escalate to sudden-death tie-breaker rounds.
    pub regulation_rounds: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            regulation_rounds: 3,
        }
    }
}

/// What a recorded move did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundProgress {
    /// First move of the pair stored; waiting on the opponent.
    AwaitingOpponent,
    /// Both moves were present; the round resolved.
    RoundResolved {
        /// Who won the round.
        outcome: RoundOutcome,
        /// True if this resolution completed the game.
        game_over: bool,
    },
}

/// Complete state of one match between two players.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    /// Session identifier.
    pub id: GameId,

    /// Fixed slot A.
    pub slot_a: PlayerSlot,

    /// Fixed slot B.
    pub slot_b: PlayerSlot,

    /// Current round number, starting at 1.
    pub current_round: u32,

    /// Round resolved and draining; no moves accepted until reset.
    pub round_complete: bool,

    /// At least one move stored for the current round.
    pub round_in_progress: bool,

    /// Sudden-death mode after tied regulation scores.
    pub is_tie_breaker: bool,

    /// All regulation rounds have been played.
    pub regular_rounds_complete: bool,

    /// Lifecycle state.
    pub status: SessionStatus,

    /// Winning player. Set iff `status == Complete`.
    pub winner: Option<PlayerId>,
}

impl GameSession {
    /// Create a session with both slots populated, active at round 1.
    pub fn new(
        id: GameId,
        player_a: (PlayerId, String),
        player_b: (PlayerId, String),
    ) -> Self {
        Self {
            id,
            slot_a: PlayerSlot::new(player_a.0, player_a.1),
            slot_b: PlayerSlot::new(player_b.0, player_b.1),
            current_round: 1,
            round_complete: false,
            round_in_progress: false,
            is_tie_breaker: false,
            regular_rounds_complete: false,
            status: SessionStatus::Active,
            winner: None,
        }
    }

    /// Which slot a player occupies, if any.
    pub fn slot_of(&self, player: PlayerId) -> Option<Slot> {
        if self.slot_a.player == player {
            Some(Slot::A)
        } else if self.slot_b.player == player {
            Some(Slot::B)
        } else {
            None
        }
    }

    /// Read a slot.
    pub fn slot(&self, slot: Slot) -> &PlayerSlot {
        match slot {
            Slot::A => &self.slot_a,
            Slot::B => &self.slot_b,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut PlayerSlot {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    /// Is the session accepting moves at all.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Has the session reached its terminal state.
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    /// Record a move for `slot`.
    ///
    /// The caller must have validated that the session is active, the
    /// round is not draining, and the slot has not already moved; this
    /// method only applies the transition.
    ///
    /// If the opponent's move is already stored the round resolves:
    /// the winner's score increments (no change on a tie), the round
    /// counter advances, and regulation / tie-breaker escalation runs.
    pub fn record_move(&mut self, slot: Slot, mv: Move, rules: &MatchRules) -> RoundProgress {
        debug_assert!(self.is_active());
        debug_assert!(!self.round_complete);
        debug_assert!(self.slot(slot).submitted.is_none());

        self.slot_mut(slot).submitted = Some(mv);

        let (Some(move_a), Some(move_b)) = (self.slot_a.submitted, self.slot_b.submitted) else {
            self.round_in_progress = true;
            return RoundProgress::AwaitingOpponent;
        };

        let outcome = resolve(move_a, move_b);
        match outcome {
            RoundOutcome::PlayerA => self.slot_a.score += 1,
            RoundOutcome::PlayerB => self.slot_b.score += 1,
            RoundOutcome::Tie => {}
        }

        let rounds_played = self.current_round;
        self.round_complete = true;
        self.round_in_progress = false;
        self.current_round += 1;

        if !self.regular_rounds_complete && rounds_played >= rules.regulation_rounds {
            self.regular_rounds_complete = true;
            if self.slot_a.score != self.slot_b.score {
                self.finish(self.leading_slot());
            } else {
                self.is_tie_breaker = true;
            }
        } else if self.is_tie_breaker {
            // Sudden death: the first decisive round ends the game.
            match outcome {
                RoundOutcome::PlayerA => self.finish(Slot::A),
                RoundOutcome::PlayerB => self.finish(Slot::B),
                RoundOutcome::Tie => {}
            }
        }

        RoundProgress::RoundResolved {
            outcome,
            game_over: self.is_complete(),
        }
    }

    /// Clear per-round move state for a fresh round.
    ///
    /// No-op by contract on completed sessions — the deferred reset timer
    /// must check before calling.
    pub fn reset_round(&mut self) {
        debug_assert!(!self.is_complete());
        self.slot_a.submitted = None;
        self.slot_b.submitted = None;
        self.round_complete = false;
        self.round_in_progress = false;
    }

    fn leading_slot(&self) -> Slot {
        if self.slot_a.score > self.slot_b.score {
            Slot::A
        } else {
            Slot::B
        }
    }

    fn finish(&mut self, winner: Slot) {
        self.winner = Some(self.slot(winner).player);
        self.status = SessionStatus::Complete;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_session() -> GameSession {
        GameSession::new(
            GameId::generate(),
            (PlayerId::generate(), "alice".to_string()),
            (PlayerId::generate(), "bob".to_string()),
        )
    }

    fn play_round(session: &mut GameSession, a: Move, b: Move) -> RoundProgress {
        let rules = MatchRules::default();
        session.record_move(Slot::A, a, &rules);
        let progress = session.record_move(Slot::B, b, &rules);
        if !session.is_complete() {
            session.reset_round();
        }
        progress
    }

    #[test]
    fn test_new_session_is_active_at_round_one() {
        let session = fresh_session();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.current_round, 1);
        assert_eq!(session.slot_a.score, 0);
        assert_eq!(session.slot_b.score, 0);
        assert!(session.winner.is_none());
    }

    #[test]
    fn test_single_submission_waits_for_opponent() {
        let mut session = fresh_session();
        let progress = session.record_move(Slot::A, Move::Rock, &MatchRules::default());

        assert_eq!(progress, RoundProgress::AwaitingOpponent);
        assert_eq!(session.slot_a.submitted, Some(Move::Rock));
        assert!(session.slot_b.submitted.is_none());
        assert!(!session.round_complete);
        assert!(session.round_in_progress);
        assert_eq!(session.current_round, 1);
    }

    #[test]
    fn test_second_submission_resolves_round() {
        let mut session = fresh_session();
        let rules = MatchRules::default();

        session.record_move(Slot::A, Move::Rock, &rules);
        let progress = session.record_move(Slot::B, Move::Scissors, &rules);

        assert_eq!(
            progress,
            RoundProgress::RoundResolved {
                outcome: crate::game::moves::RoundOutcome::PlayerA,
                game_over: false,
            }
        );
        assert_eq!(session.slot_a.score, 1);
        assert_eq!(session.slot_b.score, 0);
        assert_eq!(session.current_round, 2);
        assert!(session.round_complete);
        assert!(!session.round_in_progress);
    }

    #[test]
    fn test_tie_round_scores_nobody() {
        let mut session = fresh_session();
        play_round(&mut session, Move::Paper, Move::Paper);

        assert_eq!(session.slot_a.score, 0);
        assert_eq!(session.slot_b.score, 0);
        assert_eq!(session.current_round, 2);
    }

    #[test]
    fn test_reset_round_clears_moves() {
        let mut session = fresh_session();
        play_round(&mut session, Move::Rock, Move::Paper);

        assert!(session.slot_a.submitted.is_none());
        assert!(session.slot_b.submitted.is_none());
        assert!(!session.round_complete);
        assert!(!session.round_in_progress);
    }

    #[test]
    fn test_best_of_three_decided_on_score() {
        let mut session = fresh_session();
        let a = session.slot_a.player;

        // A wins two, B wins one: 2-1 after regulation.
        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Scissors, Move::Rock);
        let progress = play_round(&mut session, Move::Paper, Move::Rock);

        assert!(matches!(
            progress,
            RoundProgress::RoundResolved { game_over: true, .. }
        ));
        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.winner, Some(a));
        assert!(!session.is_tie_breaker);
        assert!(session.regular_rounds_complete);
    }

    #[test]
    fn test_tied_regulation_escalates_to_tie_breaker() {
        let mut session = fresh_session();

        // 1-1 with one tie round.
        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Paper, Move::Paper);
        play_round(&mut session, Move::Scissors, Move::Rock);

        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.is_tie_breaker);
        assert!(session.regular_rounds_complete);
        assert!(session.winner.is_none());
    }

    #[test]
    fn test_tie_breaker_tie_continues() {
        let mut session = fresh_session();

        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Paper, Move::Paper);
        play_round(&mut session, Move::Scissors, Move::Rock);
        assert!(session.is_tie_breaker);

        // Tied tie-breaker round leaves the game running.
        play_round(&mut session, Move::Rock, Move::Rock);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.is_tie_breaker);

        // Decisive tie-breaker round ends it.
        let b = session.slot_b.player;
        let progress = play_round(&mut session, Move::Rock, Move::Paper);
        assert!(matches!(
            progress,
            RoundProgress::RoundResolved { game_over: true, .. }
        ));
        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.winner, Some(b));
    }

    #[test]
    fn test_winner_set_iff_complete() {
        let mut session = fresh_session();
        assert!(session.winner.is_none());

        play_round(&mut session, Move::Rock, Move::Scissors);
        assert!(session.winner.is_none());

        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Rock, Move::Scissors);
        assert!(session.is_complete());
        assert!(session.winner.is_some());
    }

    #[test]
    fn test_slot_of() {
        let session = fresh_session();
        assert_eq!(session.slot_of(session.slot_a.player), Some(Slot::A));
        assert_eq!(session.slot_of(session.slot_b.player), Some(Slot::B));
        assert_eq!(session.slot_of(PlayerId::generate()), None);
    }

    #[test]
    fn test_completed_session_keeps_final_moves() {
        let mut session = fresh_session();
        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Rock, Move::Scissors);
        play_round(&mut session, Move::Rock, Move::Scissors);

        // Game over: final moves stay visible, no reset ran.
        assert!(session.is_complete());
        assert_eq!(session.slot_a.submitted, Some(Move::Rock));
        assert_eq!(session.slot_b.submitted, Some(Move::Scissors));
    }

    #[test]
    fn test_player_id_ordering_is_total() {
        let mut ids: Vec<PlayerId> = (0..8).map(|_| PlayerId::generate()).collect();
        ids.sort();
        for pair in ids.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
