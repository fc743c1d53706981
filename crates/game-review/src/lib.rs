
pub mod analysis;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod critical;
pub mod error;
pub mod evaluator;
pub mod replay;
pub mod report;
pub mod stockfish;

pub use analyzer::{analyze_with_stockfish, review_game, review_game_with, GameReview};
pub use classifier::{analyze_game, AnalysisSettings};
pub use error::{AnalysisError, ConfigError, EvaluatorError};
pub use evaluator::{Evaluates, Score};
pub use report::{AnalysisResult, CriticalMoment, SideStats};
