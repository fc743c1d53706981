//! Final per-side statistics and the analysis result handed to reporting.

use std::fmt::Write;

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::analysis::{calculate_accuracy, SeverityTier};

/// Finalized statistics for one side. Never mutated after the game is done.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub ply_count: u32,
    pub cumulative_loss: i64,
    pub ok: u32,
    pub inaccuracies: u32,
    pub mistakes: u32,
    pub blunders: u32,
    pub average_loss: f64,
    pub accuracy: f64,
}

impl SideStats {
    /// Whole-centipawn average as shown in reports
    pub fn rounded_average(&self) -> i64 {
        self.average_loss.round() as i64
    }
}

/// Running totals for one side while plies are still being classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideTotals {
    ply_count: u32,
    cumulative_loss: i64,
    ok: u32,
    inaccuracies: u32,
    mistakes: u32,
    blunders: u32,
}

impl SideTotals {
    pub fn record(&mut self, move_loss: i32, tier: SeverityTier) {
        self.ply_count += 1;
        self.cumulative_loss += i64::from(move_loss);
        match tier {
            SeverityTier::Ok => self.ok += 1,
            SeverityTier::Inaccuracy => self.inaccuracies += 1,
            SeverityTier::Mistake => self.mistakes += 1,
            SeverityTier::Blunder => self.blunders += 1,
        }
    }

    /// A side that never moved finalizes to zero average loss.
    pub fn finalize(self) -> SideStats {
        let average_loss = if self.ply_count > 0 {
            self.cumulative_loss as f64 / f64::from(self.ply_count)
        } else {
            0.0
        };

        SideStats {
            ply_count: self.ply_count,
            cumulative_loss: self.cumulative_loss,
            ok: self.ok,
            inaccuracies: self.inaccuracies,
            mistakes: self.mistakes,
            blunders: self.blunders,
            average_loss,
            accuracy: calculate_accuracy(average_loss),
        }
    }
}

/// A ply ranked among the costliest of the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalMoment {
    pub ply: u32,
    pub side: Side,
    pub san: String,
    pub uci: String,
    pub move_loss: i32,
    pub tier: SeverityTier,
    /// Position before the move, for board rendering
    pub fen: String,
    pub eval_before: i32,
    pub eval_after: i32,
}

/// Terminal output of a game analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub white: SideStats,
    pub black: SideStats,
    /// Highest loss first
    pub critical_moments: Vec<CriticalMoment>,
}

impl AnalysisResult {
    pub fn stats_for(&self, side: Side) -> &SideStats {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// Assemble the immutable result from finalized statistics.
pub fn build_result(
    white: SideStats,
    black: SideStats,
    critical_moments: Vec<CriticalMoment>,
) -> AnalysisResult {
    AnalysisResult {
        white,
        black,
        critical_moments,
    }
}

/// Plain-text statistics block for the narrative generator, written from
/// the tracked player's point of view.
pub fn format_stats_summary(result: &AnalysisResult, player: Side) -> String {
    let opponent = player.opponent();
    let mut out = String::new();
    let _ = writeln!(out, "Your stats ({player}):");
    write_side(&mut out, result.stats_for(player));
    let _ = writeln!(out);
    let _ = writeln!(out, "Opponent stats ({opponent}):");
    write_side(&mut out, result.stats_for(opponent));
    out
}

fn write_side(out: &mut String, stats: &SideStats) {
    let _ = writeln!(out, "- Average CPL: {}", stats.rounded_average());
    let _ = writeln!(out, "- Blunders: {}", stats.blunders);
    let _ = writeln!(out, "- Mistakes: {}", stats.mistakes);
    let _ = writeln!(out, "- Inaccuracies: {}", stats.inaccuracies);
}
