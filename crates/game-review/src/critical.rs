//! Critical-moment selection: keeps the costliest plies of the game.

use crate::classifier::ScoredPly;
use crate::report::CriticalMoment;

/// Default number of critical moments kept per game
pub const DEFAULT_LIMIT: usize = 3;

/// Losses at or below this are engine noise and never selected
pub const DEFAULT_FLOOR: i32 = 10;

/// Retains the `limit` highest-loss plies seen so far, across both sides.
///
/// Candidates are kept sorted by descending loss. Plies must be offered in
/// game order so that equal losses keep the earlier ply first.
#[derive(Debug, Clone)]
pub struct CriticalMomentSelector {
    limit: usize,
    floor: i32,
    moments: Vec<CriticalMoment>,
}

impl CriticalMomentSelector {
    pub fn new(limit: usize, floor: i32) -> Self {
        Self {
            limit,
            floor,
            moments: Vec::new(),
        }
    }

    pub fn offer(&mut self, scored: &ScoredPly) {
        if scored.move_loss <= self.floor {
            return;
        }
        let slot = self
            .moments
            .partition_point(|m| m.move_loss >= scored.move_loss);
        if slot >= self.limit {
            return;
        }

        self.moments.insert(slot, scored.to_critical_moment());
        self.moments.truncate(self.limit);
    }

    pub fn finish(self) -> Vec<CriticalMoment> {
        self.moments
    }
}

impl Default for CriticalMomentSelector {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_FLOOR)
    }
}
