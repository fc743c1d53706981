//! Shared game data types and PGN parsing.

pub mod game_data;
pub mod pgn;

pub use game_data::{GameData, GameMetadata, PlayerInfo, Side};
pub use pgn::{parse_pgn, PgnError};
