use game_review::{EvaluatorError, Evaluates, Score};

/// Replays a fixed list of White-relative centipawn scores, one per query.
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    scores: Vec<Score>,
    /// Zero-based query index that fails instead of answering
    fail_at: Option<(usize, EvaluatorError)>,
    /// FEN and depth of every query, in order
    pub queries: Vec<(String, u32)>,
}

impl ScriptedEvaluator {
    pub fn new(centipawns: &[i32]) -> Self {
        Self::with_scores(centipawns.iter().map(|&cp| Score::Centipawns(cp)).collect())
    }

    pub fn with_scores(scores: Vec<Score>) -> Self {
        Self {
            scores,
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, query: usize, err: EvaluatorError) -> Self {
        self.fail_at = Some((query, err));
        self
    }
}

impl Evaluates for ScriptedEvaluator {
    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<Score, EvaluatorError> {
        let index = self.queries.len();
        self.queries.push((fen.to_string(), depth));

        if let Some((at, err)) = &self.fail_at {
            if *at == index {
                return Err(err.clone());
            }
        }
        self.scores
            .get(index)
            .copied()
            .ok_or_else(|| EvaluatorError::Unavailable(format!("no scripted score for query {index}")))
    }
}

/// A short Ruy Lopez with headers, as exported by Chess.com
pub const RUY_LOPEZ_PGN: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Date "2024.03.02"]
[White "seanr87"]
[Black "rival"]
[Result "1-0"]
[WhiteElo "1510"]
[BlackElo "1495"]
[TimeControl "600"]
[ECO "C60"]
[Link "https://www.chess.com/game/live/1"]

1. e4 {[%clk 0:09:58]} e5 2. Nf3 Nc6 3. Bb5 a6 1-0
"#;
