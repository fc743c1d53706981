//! Move-quality classification: replays a game against an evaluator and
//! scores every ply for the side that played it.

use chess_core::Side;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::{calculate_move_loss, SeverityThresholds, SeverityTier};
use crate::critical::{CriticalMomentSelector, DEFAULT_FLOOR, DEFAULT_LIMIT};
use crate::error::AnalysisError;
use crate::evaluator::Evaluates;
use crate::replay::{replay, Ply, Position};
use crate::report::{self, AnalysisResult, CriticalMoment, SideStats, SideTotals};

/// Default engine search depth per position
pub const DEFAULT_DEPTH: u32 = 15;

/// Knobs for one game analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub depth: u32,
    pub thresholds: SeverityThresholds,
    pub critical_moment_limit: usize,
    pub critical_moment_floor: i32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            thresholds: SeverityThresholds::default(),
            critical_moment_limit: DEFAULT_LIMIT,
            critical_moment_floor: DEFAULT_FLOOR,
        }
    }
}

/// A ply together with the evaluations around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPly {
    pub ply: Ply,
    pub eval_before: i32,
    pub eval_after: i32,
    pub move_loss: i32,
    pub tier: SeverityTier,
}

impl ScoredPly {
    pub fn to_critical_moment(&self) -> CriticalMoment {
        CriticalMoment {
            ply: self.ply.index,
            side: self.ply.side,
            san: self.ply.san.clone(),
            uci: self.ply.uci(),
            move_loss: self.move_loss,
            tier: self.tier,
            fen: self.ply.position.fen(),
            eval_before: self.eval_before,
            eval_after: self.eval_after,
        }
    }
}

/// Accumulator threaded through the per-ply step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierState {
    last_eval: i32,
    white: SideTotals,
    black: SideTotals,
}

impl ClassifierState {
    /// Start from the evaluation of the initial position.
    pub fn new(anchor_eval: i32) -> Self {
        Self {
            last_eval: anchor_eval,
            white: SideTotals::default(),
            black: SideTotals::default(),
        }
    }

    pub fn last_eval(&self) -> i32 {
        self.last_eval
    }

    /// Score `ply` given the evaluation of the position it produced.
    pub fn step(&mut self, ply: Ply, eval_after: i32, thresholds: &SeverityThresholds) -> ScoredPly {
        let eval_before = self.last_eval;
        let move_loss = calculate_move_loss(eval_before, eval_after, ply.side);
        let tier = thresholds.classify(move_loss);

        match ply.side {
            Side::White => self.white.record(move_loss, tier),
            Side::Black => self.black.record(move_loss, tier),
        }
        self.last_eval = eval_after;

        ScoredPly {
            ply,
            eval_before,
            eval_after,
            move_loss,
            tier,
        }
    }

    /// Finalized (white, black) statistics
    pub fn finish(self) -> (SideStats, SideStats) {
        (self.white.finalize(), self.black.finalize())
    }
}

/// Analyze one finished game.
///
/// Queries `evaluator` once for the starting position and once after every
/// ply, strictly in game order. Any illegal move or evaluator failure aborts
/// the whole game; no partial result is returned. A game without moves
/// yields zeroed statistics.
pub async fn analyze_game<E, I>(
    evaluator: &mut E,
    moves: I,
    settings: &AnalysisSettings,
) -> Result<AnalysisResult, AnalysisError>
where
    E: Evaluates,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let depth = settings.depth;

    let start = Position::default();
    let anchor = evaluator
        .evaluate(&start.fen(), depth)
        .await
        .map_err(|e| AnalysisError::from_evaluator(e, None))?
        .to_centipawns();

    let mut state = ClassifierState::new(anchor);
    let mut selector =
        CriticalMomentSelector::new(settings.critical_moment_limit, settings.critical_moment_floor);

    for ply in replay(moves) {
        let ply = ply?;
        let index = ply.index;
        let eval_after = evaluator
            .evaluate(&ply.position_after().fen(), depth)
            .await
            .map_err(|e| AnalysisError::from_evaluator(e, Some(index)))?
            .to_centipawns();

        let scored = state.step(ply, eval_after, &settings.thresholds);
        debug!(
            ply = index,
            side = %scored.ply.side,
            san = %scored.ply.san,
            eval_after,
            loss = scored.move_loss,
            tier = ?scored.tier,
            "Scored ply"
        );
        selector.offer(&scored);
    }

    let (white, black) = state.finish();
    let result = report::build_result(white, black, selector.finish());

    info!(
        plies = result.white.ply_count + result.black.ply_count,
        white_avg_loss = result.white.average_loss,
        black_avg_loss = result.black.average_loss,
        critical_moments = result.critical_moments.len(),
        "Game analysis complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_plies() -> Vec<Ply> {
        replay(["d4", "d5", "c4"]).map(|p| p.unwrap()).collect()
    }

    #[test]
    fn test_step_attributes_loss_to_mover() {
        let thresholds = SeverityThresholds::default();
        let mut plies = first_plies().into_iter();
        let mut state = ClassifierState::new(20);

        let white = state.step(plies.next().unwrap(), -90, &thresholds);
        assert_eq!(white.eval_before, 20);
        assert_eq!(white.move_loss, 110);
        assert_eq!(white.tier, SeverityTier::Mistake);

        // Black lets the evaluation swing back up: that is Black's loss
        let black = state.step(plies.next().unwrap(), 300, &thresholds);
        assert_eq!(black.move_loss, 390);
        assert_eq!(black.tier, SeverityTier::Blunder);

        // White improving scores as zero loss
        let white = state.step(plies.next().unwrap(), 350, &thresholds);
        assert_eq!(white.move_loss, 0);
        assert_eq!(state.last_eval(), 350);

        let (white, black) = state.finish();
        assert_eq!(white.ply_count, 2);
        assert_eq!(white.cumulative_loss, 110);
        assert_eq!(white.mistakes, 1);
        assert_eq!(white.ok, 1);
        assert_eq!(white.average_loss, 55.0);
        assert_eq!(black.ply_count, 1);
        assert_eq!(black.blunders, 1);
    }

    #[test]
    fn test_critical_moment_from_scored_ply() {
        let thresholds = SeverityThresholds::default();
        let mut state = ClassifierState::new(0);
        let ply = first_plies().remove(0);
        let fen = ply.position.fen();

        let moment = state.step(ply, -40, &thresholds).to_critical_moment();
        assert_eq!(moment.ply, 1);
        assert_eq!(moment.side, Side::White);
        assert_eq!(moment.san, "d4");
        assert_eq!(moment.uci, "d2d4");
        assert_eq!(moment.fen, fen);
        assert_eq!((moment.eval_before, moment.eval_after), (0, -40));
        assert_eq!(moment.tier, SeverityTier::Inaccuracy);
    }
}
