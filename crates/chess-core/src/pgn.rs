//! PGN parsing: tags and mainline SAN moves via `pgn_reader`.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use thiserror::Error;

use crate::game_data::{GameData, GameMetadata, PlayerInfo, Side};

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Move prefixes used when the PGN carries no usable `Opening` header.
const KNOWN_OPENINGS: &[(&[&str], &str)] = &[
    (&["e4", "c5", "Nf3"], "Sicilian Defense"),
    (&["d4", "d5", "c4"], "Queen's Gambit"),
    (&["e4", "e5"], "Open Game"),
    (&["d4", "Nf6"], "Indian Game"),
    (&["e4", "c6", "Nc3"], "Caro-Kann Defense"),
    (&["e4", "e6"], "French Defense"),
    (&["Nf3", "Nf6", "c4"], "English Opening"),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PgnError {
    #[error("Game does not start from the standard position: {0}")]
    NonStandardStart(String),

    #[error("No game found in PGN")]
    Empty,

    #[error("Failed to read PGN: {0}")]
    Read(String),
}

/// Header values collected while reading the tag section.
#[derive(Default)]
struct GameTags {
    white: Option<String>,
    black: Option<String>,
    result: Option<String>,
    white_elo: Option<i32>,
    black_elo: Option<i32>,
    date: Option<String>,
    time_control: Option<String>,
    eco: Option<String>,
    opening: Option<String>,
    event: Option<String>,
    link: Option<String>,
    setup: Option<String>,
    fen: Option<String>,
}

/// State during movetext parsing.
struct GameState {
    tags: GameTags,
    moves: Vec<String>,
}

/// Visitor that keeps the tags and the mainline of the first game.
/// Variations are skipped by `pgn_reader`, nested or not.
struct MainlineCollector;

impl Visitor for MainlineCollector {
    type Tags = GameTags;
    type Movetext = GameState;
    type Output = (GameTags, Vec<String>);

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut GameTags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let value = value.decode_utf8_lossy().into_owned();
        match name {
            b"White" => tags.white = Some(value),
            b"Black" => tags.black = Some(value),
            b"Result" => tags.result = Some(value),
            b"WhiteElo" => tags.white_elo = value.parse().ok(),
            b"BlackElo" => tags.black_elo = value.parse().ok(),
            b"Date" => tags.date = Some(value),
            b"TimeControl" => tags.time_control = Some(value),
            b"ECO" => tags.eco = Some(value),
            b"Opening" => tags.opening = Some(value),
            b"Event" => tags.event = Some(value),
            b"Link" => tags.link = Some(value),
            b"SetUp" => tags.setup = Some(value),
            b"FEN" => tags.fen = Some(value),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<Self::Output, GameState> {
        ControlFlow::Continue(GameState {
            tags,
            moves: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _state: &mut GameState) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, state: &mut GameState, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        state.moves.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, state: GameState) -> Self::Output {
        (state.tags, state.moves)
    }
}

/// Parse a single-game PGN string into a GameData struct.
///
/// Only the first game's mainline is kept. Games set up from a custom FEN
/// are rejected, since analysis always replays from the standard starting
/// position. A game without moves is returned as-is.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let (tags, moves) = reader
        .read_game(&mut MainlineCollector)
        .map_err(|e| PgnError::Read(e.to_string()))?
        .ok_or(PgnError::Empty)?;

    if tags.setup.as_deref() == Some("1") {
        if let Some(fen) = tags.fen {
            if fen != STANDARD_START_FEN {
                return Err(PgnError::NonStandardStart(fen));
            }
        }
    }

    let opening = match tags.opening {
        Some(name) if !name.trim().is_empty() && name.trim() != "?" => name,
        _ => infer_opening(&moves).to_string(),
    };

    let metadata = GameMetadata {
        white: tags.white.unwrap_or_else(|| "Unknown".to_string()),
        black: tags.black.unwrap_or_else(|| "Unknown".to_string()),
        white_elo: tags.white_elo,
        black_elo: tags.black_elo,
        result: tags.result.unwrap_or_else(|| "*".to_string()),
        date: tags.date,
        time_control: tags.time_control,
        eco: tags.eco,
        opening,
        event: tags.event,
        link: tags.link,
    };

    Ok(GameData {
        metadata,
        moves,
        pgn: pgn.to_string(),
    })
}

/// Name the opening from the first moves, ignoring check markers.
pub fn infer_opening(moves: &[String]) -> &'static str {
    let played: Vec<&str> = moves
        .iter()
        .map(|m| m.trim_end_matches(['+', '#']))
        .collect();

    KNOWN_OPENINGS
        .iter()
        .find(|(prefix, _)| played.starts_with(prefix))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown Opening")
}

/// Work out which side the tracked player had.
///
/// Matches `username` case-insensitively against the White header; any other
/// game is treated as the player having Black.
pub fn player_info(metadata: &GameMetadata, username: &str) -> PlayerInfo {
    let describe = |name: &str, elo: Option<i32>| match elo {
        Some(elo) => format!("{name} ({elo})"),
        None => format!("{name} (N/A)"),
    };
    let white = describe(&metadata.white, metadata.white_elo);
    let black = describe(&metadata.black, metadata.black_elo);

    if metadata.white.eq_ignore_ascii_case(username) {
        PlayerInfo {
            you: white,
            opponent: black,
            color: Side::White,
        }
    } else {
        PlayerInfo {
            you: black,
            opponent: white,
            color: Side::Black,
        }
    }
}
