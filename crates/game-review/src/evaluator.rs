//! Position evaluation boundary.
//!
//! The classifier only sees the [`Evaluates`] capability, so any oracle that
//! can score a FEN at a given depth can drive an analysis: the Stockfish
//! process in production, scripted scores in tests.

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::error::EvaluatorError;

/// Centipawn value standing in for a forced mate. Mate in N is reported as
/// `MATE_SCORE - N` for the mating side, so every evaluation stays within
/// `±MATE_SCORE`.
pub const MATE_SCORE: i32 = 10_000;

/// Longest mate distance kept apart from ordinary scores.
const MAX_MATE_MOVES: u32 = 1_000;

/// An engine verdict, always from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    /// `moves == 0` means the loser is already checkmated.
    Mate { winner: Side, moves: u32 },
}

impl Score {
    /// Build a White-relative score from a UCI `score cp`/`score mate` pair,
    /// which the engine reports for the side to move.
    pub fn from_uci(cp: Option<i32>, mate: Option<i32>, side_to_move: Side) -> Option<Self> {
        if let Some(m) = mate {
            // "mate 0" and negative counts: the side to move is getting mated
            let winner = if m > 0 { side_to_move } else { side_to_move.opponent() };
            return Some(Score::Mate {
                winner,
                moves: m.unsigned_abs(),
            });
        }
        cp.map(|c| match side_to_move {
            Side::White => Score::Centipawns(c),
            Side::Black => Score::Centipawns(-c),
        })
    }

    /// Collapse into bounded White-relative centipawns.
    pub fn to_centipawns(self) -> i32 {
        match self {
            Score::Centipawns(cp) => cp.clamp(-MATE_SCORE, MATE_SCORE),
            Score::Mate { winner, moves } => {
                // MAX_MATE_MOVES fits in i32
                let value = MATE_SCORE - moves.min(MAX_MATE_MOVES) as i32;
                match winner {
                    Side::White => value,
                    Side::Black => -value,
                }
            }
        }
    }
}

/// Something that can score a chess position.
///
/// Implementations hold one board context at a time; callers issue queries
/// strictly one after another. Any error is final for the game being
/// analysed.
#[allow(async_fn_in_trait)]
pub trait Evaluates {
    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<Score, EvaluatorError>;
}

/// Active colour field of a FEN string.
pub fn side_to_move(fen: &str) -> Option<Side> {
    match fen.split_whitespace().nth(1)? {
        "w" => Some(Side::White),
        "b" => Some(Side::Black),
        _ => None,
    }
}
