//! Game review orchestration: one Stockfish process per game, released on
//! every exit path.

use chess_core::pgn::player_info;
use chess_core::{GameData, GameMetadata, PlayerInfo};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::{analyze_game, AnalysisSettings};
use crate::config::ReviewConfig;
use crate::error::AnalysisError;
use crate::evaluator::Evaluates;
use crate::report::{format_stats_summary, AnalysisResult};
use crate::stockfish::{EngineOptions, StockfishEngine};

/// Everything the report and persistence collaborators need for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReview {
    pub metadata: GameMetadata,
    pub move_count: usize,
    /// Present when the tracked player's username is configured
    pub player: Option<PlayerInfo>,
    pub analysis: AnalysisResult,
    pub stats_summary: Option<String>,
}

/// Analyze `moves` with a freshly spawned engine.
///
/// The engine is shut down whether the analysis succeeds or fails. If the
/// returned future is dropped early, the engine process is killed on drop.
pub async fn analyze_with_stockfish<I>(
    options: &EngineOptions,
    moves: I,
    settings: &AnalysisSettings,
) -> Result<AnalysisResult, AnalysisError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut engine = StockfishEngine::spawn(options)
        .await
        .map_err(|e| AnalysisError::from_evaluator(e, None))?;

    let result = analyze_game(&mut engine, moves, settings).await;
    engine.quit().await;

    if let Err(e) = &result {
        warn!(error = %e, "Game analysis aborted");
    }
    result
}

/// Review a parsed game using the Stockfish configured in `config`.
pub async fn review_game(config: &ReviewConfig, game: &GameData) -> Result<GameReview, AnalysisError> {
    let analysis = analyze_with_stockfish(&config.engine, &game.moves, &config.settings).await?;
    Ok(assemble_review(config.username.as_deref(), game, analysis))
}

/// Review a parsed game against any evaluator.
pub async fn review_game_with<E: Evaluates>(
    evaluator: &mut E,
    settings: &AnalysisSettings,
    username: Option<&str>,
    game: &GameData,
) -> Result<GameReview, AnalysisError> {
    let analysis = analyze_game(evaluator, &game.moves, settings).await?;
    Ok(assemble_review(username, game, analysis))
}

fn assemble_review(username: Option<&str>, game: &GameData, analysis: AnalysisResult) -> GameReview {
    let player = username.map(|name| player_info(&game.metadata, name));
    let stats_summary = player
        .as_ref()
        .map(|p| format_stats_summary(&analysis, p.color));

    info!(
        white = %game.metadata.white,
        black = %game.metadata.black,
        opening = %game.metadata.opening,
        moves = game.move_count(),
        "Review ready"
    );

    GameReview {
        metadata: game.metadata.clone(),
        move_count: game.move_count(),
        player,
        analysis,
        stats_summary,
    }
}
