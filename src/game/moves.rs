//! Round Resolution
//!
//! The pure rock-paper-scissors resolver. No state, no I/O:
//! given two submitted moves, which slot won the round.

use serde::{Deserialize, Serialize};

/// A move submitted by a player for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Move {
    /// Beats scissors.
    Rock = 0,
    /// Beats rock.
    Paper = 1,
    /// Beats paper.
    Scissors = 2,
}

impl Move {
    /// All moves, in declaration order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The move this one defeats.
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Paper => Move::Rock,
            Move::Scissors => Move::Paper,
        }
    }
}

/// Outcome of resolving one round between slot A and slot B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Identical moves; nobody scores.
    Tie,
    /// Slot A's move won.
    PlayerA,
    /// Slot B's move won.
    PlayerB,
}

impl RoundOutcome {
    /// True if one of the players won.
    pub fn is_decisive(self) -> bool {
        !matches!(self, RoundOutcome::Tie)
    }

    /// Outcome as seen from the other side of the table.
    pub fn flipped(self) -> RoundOutcome {
        match self {
            RoundOutcome::Tie => RoundOutcome::Tie,
            RoundOutcome::PlayerA => RoundOutcome::PlayerB,
            RoundOutcome::PlayerB => RoundOutcome::PlayerA,
        }
    }
}

/// Resolve one round. Total and side-effect free.
///
/// Identical moves tie; otherwise exactly one beats-relation
/// (rock > scissors, scissors > paper, paper > rock) decides it.
pub fn resolve(move_a: Move, move_b: Move) -> RoundOutcome {
    if move_a == move_b {
        RoundOutcome::Tie
    } else if move_a.beats() == move_b {
        RoundOutcome::PlayerA
    } else {
        RoundOutcome::PlayerB
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_moves_tie() {
        for m in Move::ALL {
            assert_eq!(resolve(m, m), RoundOutcome::Tie);
        }
    }

    #[test]
    fn test_beats_cycle() {
        assert_eq!(resolve(Move::Rock, Move::Scissors), RoundOutcome::PlayerA);
        assert_eq!(resolve(Move::Scissors, Move::Paper), RoundOutcome::PlayerA);
        assert_eq!(resolve(Move::Paper, Move::Rock), RoundOutcome::PlayerA);

        assert_eq!(resolve(Move::Scissors, Move::Rock), RoundOutcome::PlayerB);
        assert_eq!(resolve(Move::Paper, Move::Scissors), RoundOutcome::PlayerB);
        assert_eq!(resolve(Move::Rock, Move::Paper), RoundOutcome::PlayerB);
    }

    fn any_move() -> impl Strategy<Value = Move> {
        (0..Move::ALL.len()).prop_map(|i| Move::ALL[i])
    }

    proptest! {
        #[test]
        fn prop_symmetric_under_swap(a in any_move(), b in any_move()) {
            prop_assert_eq!(resolve(a, b), resolve(b, a).flipped());
        }

        #[test]
        fn prop_distinct_moves_are_decisive(a in any_move(), b in any_move()) {
            if a != b {
                prop_assert!(resolve(a, b).is_decisive());
            }
        }
    }
}
