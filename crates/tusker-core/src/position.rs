//! The chess position: piece placement, side to move, castling, en passant,
//! move counters, and the incrementally maintained Zobrist hash.

use std::fmt;

use crate::bitboard::Bitboard;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::movegen::legal_moves;
use crate::piece::PieceKind;
use crate::square::Square;

/// Outcome classification for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// The game continues.
    Ongoing,
    /// The side to move is checkmated.
    Checkmate,
    /// Stalemate or fifty-move draw.
    Draw,
}

/// Maximum phase value: a full middlegame complement of non-pawn material.
///
/// Weights: knight = bishop = 1, rook = 2, queen = 4, so the starting
/// position sums to 4 + 4 + 8 + 8 = 24.
pub const MAX_PHASE: i32 = 24;

/// A complete chess position with value semantics.
///
/// `Position` is `Copy`; [`make_move`](Position::make_move) and
/// [`make_null`](Position::make_null) return successor positions and never
/// mutate the receiver, so a search holds each node's position immutably and
/// unwinding is free.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Bitboard per piece kind (both colors), indexed by `PieceKind::index()`.
    pub(crate) pieces: [Bitboard; PieceKind::COUNT],
    /// Bitboard per side, indexed by `Color::index()`.
    pub(crate) sides: [Bitboard; Color::COUNT],
    /// Union of both sides, cached.
    pub(crate) occupied: Bitboard,
    /// Which side moves next.
    pub(crate) side_to_move: Color,
    /// Current castling rights.
    pub(crate) castling: CastleRights,
    /// En passant target square, if any.
    pub(crate) en_passant: Option<Square>,
    /// Halfmove clock for the fifty-move rule.
    pub(crate) halfmove_clock: u16,
    /// Fullmove number (starts at 1, incremented after Black moves).
    pub(crate) fullmove_number: u16,
    /// Zobrist hash of the position.
    pub(crate) hash: u64,
}

impl Position {
    /// Return the standard starting position.
    pub fn starting_position() -> Position {
        crate::fen::STARTING_FEN
            .parse()
            .expect("starting FEN is valid")
    }

    /// Return the piece kind on the given square, if any.
    pub fn piece_at(&self, sq: Square) -> Option<PieceKind> {
        if !self.occupied.contains(sq) {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces[kind.index()].contains(sq))
    }

    /// Return the color of the piece on the given square, if any.
    pub fn color_at(&self, sq: Square) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|&color| self.sides[color.index()].contains(sq))
    }

    /// Return the bitboard for the given piece kind (both colors).
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// Return the bitboard for the given side.
    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    /// Return the occupied squares bitboard.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    /// Return the square of the king for the given side.
    ///
    /// # Panics
    ///
    /// Panics if the side has no king (invalid position).
    pub fn king_square(&self, color: Color) -> Square {
        (self.pieces[PieceKind::King.index()] & self.sides[color.index()])
            .lsb()
            .expect("position must have a king for each side")
    }

    /// Return the side to move.
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Return the current castling rights.
    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    /// Return the en passant target square, if any.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Return the halfmove clock.
    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    /// Return the fullmove number.
    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Return the Zobrist hash of the position.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Game phase from non-pawn material, in `0..=MAX_PHASE`.
    ///
    /// Low values denote the endgame; [`MAX_PHASE`] is a full middlegame
    /// material set. Promotions are clamped so the phase never exceeds the
    /// maximum.
    pub fn phase(&self) -> i32 {
        let knights = self.pieces(PieceKind::Knight).count() as i32;
        let bishops = self.pieces(PieceKind::Bishop).count() as i32;
        let rooks = self.pieces(PieceKind::Rook).count() as i32;
        let queens = self.pieces(PieceKind::Queen).count() as i32;
        (knights + bishops + 2 * rooks + 4 * queens).min(MAX_PHASE)
    }

    /// Classify the position for the side to move.
    ///
    /// Repetition draws are not detected here; they require game history that
    /// a single position does not carry.
    pub fn game_over(&self) -> GameStatus {
        if legal_moves(self).is_empty() {
            return if self.in_check() {
                GameStatus::Checkmate
            } else {
                GameStatus::Draw
            };
        }
        if self.halfmove_clock >= 100 {
            return GameStatus::Draw;
        }
        GameStatus::Ongoing
    }

    /// Return a pretty-printable wrapper for this position.
    pub fn pretty(&self) -> PrettyPosition<'_> {
        PrettyPosition(self)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{self}\")")
    }
}

/// Wrapper for pretty-printing a position as an 8x8 grid.
pub struct PrettyPosition<'a>(&'a Position);

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.0;
        for rank in (0u8..8).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0u8..8 {
                let sq = Square::from_index(rank * 8 + file).unwrap();
                let c = match (pos.piece_at(sq), pos.color_at(sq)) {
                    (Some(kind), Some(Color::White)) => kind.fen_char().to_ascii_uppercase(),
                    (Some(kind), Some(Color::Black)) => kind.fen_char(),
                    _ => '.',
                };
                write!(f, "{c}")?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::{GameStatus, MAX_PHASE, Position};
    use crate::color::Color;
    use crate::piece::PieceKind;
    use crate::square::Square;

    #[test]
    fn starting_position_layout() {
        let pos = Position::starting_position();
        assert_eq!(pos.piece_at(Square::E1), Some(PieceKind::King));
        assert_eq!(pos.piece_at(Square::D8), Some(PieceKind::Queen));
        assert_eq!(pos.piece_at(Square::E4), None);
        assert_eq!(pos.color_at(Square::A1), Some(Color::White));
        assert_eq!(pos.color_at(Square::A8), Some(Color::Black));
        assert_eq!(pos.occupied().count(), 32);
        assert_eq!(pos.side_to_move(), Color::White);
    }

    #[test]
    fn king_squares() {
        let pos = Position::starting_position();
        assert_eq!(pos.king_square(Color::White), Square::E1);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
    }

    #[test]
    fn phase_of_starting_position_is_max() {
        assert_eq!(Position::starting_position().phase(), MAX_PHASE);
    }

    #[test]
    fn phase_of_bare_kings_is_zero() {
        let pos: Position = "8/8/4k3/8/8/4K3/8/8 w - - 0 1".parse().unwrap();
        assert_eq!(pos.phase(), 0);
    }

    #[test]
    fn game_over_ongoing() {
        assert_eq!(Position::starting_position().game_over(), GameStatus::Ongoing);
    }

    #[test]
    fn game_over_checkmate() {
        // Back-rank mate: black king h8, white queen g7 defended by king f6.
        let pos: Position = "7k/6Q1/5K2/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert_eq!(pos.game_over(), GameStatus::Checkmate);
    }

    #[test]
    fn game_over_stalemate() {
        let pos: Position = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert_eq!(pos.game_over(), GameStatus::Draw);
    }

    #[test]
    fn game_over_fifty_moves() {
        let pos: Position = "8/8/4k3/8/8/4K3/7R/8 w - - 100 80".parse().unwrap();
        assert_eq!(pos.game_over(), GameStatus::Draw);
    }

    #[test]
    fn pretty_print_contains_ranks() {
        let out = format!("{}", Position::starting_position().pretty());
        assert!(out.contains("r n b q k b n r"));
        assert!(out.contains("R N B Q K B N R"));
        assert!(out.contains("a b c d e f g h"));
    }
}
