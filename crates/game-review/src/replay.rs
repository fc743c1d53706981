//! Game replay: turns a recorded SAN move list into ordered plies.

use chess::{Board, ChessMove, Color, File, MoveGen, Piece, Rank, Square};
use chess_core::Side;

use crate::error::AnalysisError;

/// Board state before a move, with the FEN move counters. Immutable once
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
    /// Plies since the last capture or pawn move
    halfmove_clock: u32,
    /// Starts at 1, incremented after each Black move
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Full FEN of this position, move counters included
    pub fn fen(&self) -> String {
        // `Board` always prints "0 1" for the counters
        let board_fen = self.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn side_to_move(&self) -> Side {
        match self.board.side_to_move() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    /// The position reached by playing `mv`, which must be legal here.
    pub fn after(&self, mv: ChessMove) -> Position {
        let resets_clock = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();
        let halfmove_clock = if resets_clock { 0 } else { self.halfmove_clock + 1 };
        let fullmove_number = match self.board.side_to_move() {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number + 1,
        };

        Position {
            board: self.board.make_move_new(mv),
            halfmove_clock,
            fullmove_number,
        }
    }
}

/// One half-move of the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ply {
    /// 1-based
    pub index: u32,
    pub side: Side,
    pub san: String,
    pub chess_move: ChessMove,
    pub position: Position,
}

impl Ply {
    pub fn uci(&self) -> String {
        self.chess_move.to_string()
    }

    pub fn position_after(&self) -> Position {
        self.position.after(self.chess_move)
    }
}

/// Forward-only replay of a move list from the standard starting position.
///
/// Each ply is yielded once, in game order. The first illegal move is
/// yielded as an error and ends the replay.
pub struct Replay<I> {
    moves: I,
    position: Position,
    index: u32,
    done: bool,
}

/// Start replaying `moves` (SAN) from the standard starting position.
pub fn replay<I>(moves: I) -> Replay<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Replay {
        moves: moves.into_iter(),
        position: Position::default(),
        index: 0,
        done: false,
    }
}

impl<I> Iterator for Replay<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<Ply, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(san) = self.moves.next() else {
            self.done = true;
            return None;
        };
        let san = san.as_ref().trim();
        self.index += 1;

        match find_san_move(self.position.board(), san) {
            Ok(chess_move) => {
                let ply = Ply {
                    index: self.index,
                    side: self.position.side_to_move(),
                    san: san.to_string(),
                    chess_move,
                    position: self.position,
                };
                self.position = self.position.after(chess_move);
                Some(Ok(ply))
            }
            Err(reason) => {
                self.done = true;
                Some(Err(AnalysisError::IllegalMove {
                    ply: self.index,
                    san: san.to_string(),
                    reason,
                }))
            }
        }
    }
}

/// Find the legal move matching a SAN string
fn find_san_move(board: &Board, san: &str) -> Result<ChessMove, String> {
    let clean = san.trim_end_matches(|c: char| c == '+' || c == '#' || c == '!' || c == '?');

    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if clean == "O-O" || clean == "0-0" {
        return find_castle(board, &legal_moves, true)
            .ok_or_else(|| "no kingside castling available".to_string());
    }
    if clean == "O-O-O" || clean == "0-0-0" {
        return find_castle(board, &legal_moves, false)
            .ok_or_else(|| "no queenside castling available".to_string());
    }

    // Parse piece, disambiguation, capture, destination, promotion
    let bytes = clean.as_bytes();
    if bytes.is_empty() {
        return Err("empty move".to_string());
    }

    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            other => return Err(format!("unknown piece '{}'", other as char)),
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    let (rest, promotion) = if let Some(eq_pos) = rest.find('=') {
        let promo_piece = match rest.as_bytes().get(eq_pos + 1) {
            Some(b'Q') => Piece::Queen,
            Some(b'R') => Piece::Rook,
            Some(b'B') => Piece::Bishop,
            Some(b'N') => Piece::Knight,
            _ => return Err("invalid promotion piece".to_string()),
        };
        (&rest[..eq_pos], Some(promo_piece))
    } else {
        (rest, None)
    };

    let rest = rest.replace('x', "");

    // The last two characters are the destination square
    let rest_bytes = rest.as_bytes();
    if rest_bytes.len() < 2 {
        return Err("move too short".to_string());
    }

    let dest_file = rest_bytes[rest_bytes.len() - 2];
    let dest_rank = rest_bytes[rest_bytes.len() - 1];

    if !(b'a'..=b'h').contains(&dest_file) || !(b'1'..=b'8').contains(&dest_rank) {
        return Err("invalid destination square".to_string());
    }

    let dest = Square::make_square(
        Rank::from_index((dest_rank - b'1') as usize),
        File::from_index((dest_file - b'a') as usize),
    );

    let disambig = &rest_bytes[..rest_bytes.len() - 2];

    let candidates: Vec<ChessMove> = legal_moves
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .filter(|m| {
            let src = m.get_source();
            disambig.iter().all(|&b| match b {
                b'a'..=b'h' => src.get_file().to_index() == (b - b'a') as usize,
                b'1'..=b'8' => src.get_rank().to_index() == (b - b'1') as usize,
                _ => false,
            })
        })
        .collect();

    match candidates.as_slice() {
        [only] => Ok(*only),
        [] => Err("no legal move matches".to_string()),
        many => Err(format!("ambiguous ({} candidates)", many.len())),
    }
}

fn find_castle(board: &Board, legal_moves: &[ChessMove], kingside: bool) -> Option<ChessMove> {
    legal_moves.iter().copied().find(|m| {
        if board.piece_on(m.get_source()) != Some(Piece::King) {
            return false;
        }
        let src_file = m.get_source().get_file().to_index();
        let dst_file = m.get_dest().get_file().to_index();
        if kingside {
            dst_file == src_file + 2
        } else {
            src_file == dst_file + 2
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plies(moves: &[&str]) -> Vec<Result<Ply, AnalysisError>> {
        replay(moves.iter().copied()).collect()
    }

    #[test]
    fn test_replay_yields_pre_move_positions() {
        let result = plies(&["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(result.len(), 4);

        let first = result[0].as_ref().unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.side, Side::White);
        assert_eq!(first.uci(), "e2e4");
        assert!(first
            .position
            .fen()
            .starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq"));

        let second = result[1].as_ref().unwrap();
        assert_eq!(second.index, 2);
        assert_eq!(second.side, Side::Black);
        assert_eq!(second.position, first.position_after());
        assert!(second.position.fen().contains(" b "));
    }

    #[test]
    fn test_fen_tracks_move_counters() {
        let result = plies(&["e4", "e5", "Nf3", "Nc6", "Ng1"]);
        let last = result[4].as_ref().unwrap();

        assert!(last.position.fen().ends_with(" w KQkq - 2 3"));
        assert!(last.position_after().fen().ends_with(" b KQkq - 3 3"));
        assert_eq!(last.position_after().halfmove_clock(), 3);
        assert_eq!(last.position_after().fullmove_number(), 3);
    }

    #[test]
    fn test_capture_resets_halfmove_clock() {
        let result = plies(&["e4", "d5", "Nf3", "Nc6", "exd5"]);
        let capture = result[4].as_ref().unwrap();

        assert_eq!(capture.position.halfmove_clock(), 2);
        assert_eq!(capture.position_after().halfmove_clock(), 0);
        assert!(capture.position_after().fen().ends_with(" 0 3"));
    }

    #[test]
    fn test_illegal_move_ends_replay() {
        let mut game = replay(["e4", "e5", "Ke3", "Nc6"]);
        assert!(game.next().unwrap().is_ok());
        assert!(game.next().unwrap().is_ok());

        match game.next() {
            Some(Err(AnalysisError::IllegalMove { ply, san, .. })) => {
                assert_eq!(ply, 3);
                assert_eq!(san, "Ke3");
            }
            other => panic!("expected illegal move, got {other:?}"),
        }
        assert!(game.next().is_none());
        assert!(game.next().is_none());
    }

    #[test]
    fn test_castling_and_check_suffix() {
        let result = plies(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"]);
        let castle = result[6].as_ref().unwrap();
        assert_eq!(castle.uci(), "e1g1");

        let result = plies(&["e4", "f5", "Qh5+"]);
        assert_eq!(result[2].as_ref().unwrap().uci(), "d1h5");
    }

    #[test]
    fn test_disambiguation() {
        let result = plies(&["d4", "d5", "Nf3", "Nf6", "Nbd2"]);
        assert_eq!(result[4].as_ref().unwrap().uci(), "b1d2");

        let result = plies(&["d4", "d5", "Nf3", "Nf6", "Nd2"]);
        assert!(matches!(
            result[4],
            Err(AnalysisError::IllegalMove { ply: 5, .. })
        ));
    }

    #[test]
    fn test_pawn_capture() {
        let result = plies(&["e4", "d5", "exd5"]);
        assert_eq!(result[2].as_ref().unwrap().uci(), "e4d5");
    }

    #[test]
    fn test_empty_game() {
        assert!(plies(&[]).is_empty());
    }
}
