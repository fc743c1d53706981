//! Move loss and severity classification: pure functions only
//! (No Board/Engine dependencies)

use chess_core::Side;
use serde::{Deserialize, Serialize};

/// Classification thresholds (centipawn loss, strictly greater than)
pub const THRESHOLD_INACCURACY: i32 = 20;
pub const THRESHOLD_MISTAKE: i32 = 75;
pub const THRESHOLD_BLUNDER: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Ok,
    Inaccuracy,
    Mistake,
    Blunder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            inaccuracy: THRESHOLD_INACCURACY,
            mistake: THRESHOLD_MISTAKE,
            blunder: THRESHOLD_BLUNDER,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, move_loss: i32) -> SeverityTier {
        if move_loss > self.blunder {
            SeverityTier::Blunder
        } else if move_loss > self.mistake {
            SeverityTier::Mistake
        } else if move_loss > self.inaccuracy {
            SeverityTier::Inaccuracy
        } else {
            SeverityTier::Ok
        }
    }
}

/// Evaluation lost by `mover`. Both evaluations are White-relative and
/// bounded, so the difference cannot overflow.
pub fn calculate_move_loss(eval_before: i32, eval_after: i32, mover: Side) -> i32 {
    let loss = match mover {
        Side::White => eval_before - eval_after,
        Side::Black => eval_after - eval_before,
    };
    loss.max(0)
}

pub fn calculate_accuracy(average_loss: f64) -> f64 {
    let accuracy = 100.0 * (1.0 / (1.0 + average_loss / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}
