//! Forsyth-Edwards Notation parsing and emission.

use std::fmt;
use std::str::FromStr;

use crate::bitboard::Bitboard;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::{File, Rank, Square};
use crate::zobrist;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl FromStr for Position {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::WrongFieldCount { found: fields.len() });
        }

        let mut pieces = [Bitboard::EMPTY; PieceKind::COUNT];
        let mut sides = [Bitboard::EMPTY; Color::COUNT];

        // Field 1: piece placement, rank 8 down to rank 1.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPlacement {
                reason: "placement must have 8 ranks",
            });
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip == 9 {
                        return Err(FenError::InvalidPlacement {
                            reason: "rank skip must be 1..=8",
                        });
                    }
                    file += skip as u8;
                } else {
                    let kind = PieceKind::from_fen_char(c).ok_or(FenError::InvalidPlacement {
                        reason: "unknown piece character",
                    })?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::InvalidPlacement {
                            reason: "rank has more than 8 squares",
                        });
                    }
                    let sq = Square::new(
                        Rank::from_index(rank).expect("rank in range"),
                        File::from_index(file).expect("file in range"),
                    );
                    pieces[kind.index()] = pieces[kind.index()].with(sq);
                    sides[color.index()] = sides[color.index()].with(sq);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::InvalidPlacement {
                    reason: "rank does not cover 8 squares",
                });
            }
        }

        // Field 2: side to move.
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    field: other.to_string(),
                });
            }
        };

        // Field 3: castling rights.
        let mut castling = CastleRights::NONE;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                castling = match c {
                    'K' => castling.with(CastleRights::WHITE_KING),
                    'Q' => castling.with(CastleRights::WHITE_QUEEN),
                    'k' => castling.with(CastleRights::BLACK_KING),
                    'q' => castling.with(CastleRights::BLACK_QUEEN),
                    _ => {
                        return Err(FenError::InvalidCastling {
                            field: fields[2].to_string(),
                        });
                    }
                };
            }
        }

        // Field 4: en passant target.
        let en_passant = if fields[3] == "-" {
            None
        } else {
            Some(
                Square::from_algebraic(fields[3]).ok_or_else(|| FenError::InvalidEnPassant {
                    field: fields[3].to_string(),
                })?,
            )
        };

        // Fields 5 and 6: move counters.
        let halfmove_clock: u16 = fields[4].parse().map_err(|_| FenError::InvalidCounter {
            field: fields[4].to_string(),
        })?;
        let fullmove_number: u16 = fields[5].parse().map_err(|_| FenError::InvalidCounter {
            field: fields[5].to_string(),
        })?;

        let occupied = sides[0] | sides[1];
        let mut pos = Position {
            pieces,
            sides,
            occupied,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            hash: 0,
        };

        // Minimal structural validation: exactly one king per side, no pawns
        // on the back ranks.
        for color in Color::ALL {
            if (pos.pieces(PieceKind::King) & pos.side(color)).count() != 1 {
                return Err(FenError::IllegalPosition {
                    reason: "each side must have exactly one king",
                });
            }
        }
        if (pos.pieces(PieceKind::Pawn) & (Bitboard::RANK_1 | Bitboard::RANK_8)).is_nonempty() {
            return Err(FenError::IllegalPosition {
                reason: "pawns cannot stand on the back ranks",
            });
        }

        pos.hash = zobrist::hash_from_scratch(&pos);
        Ok(pos)
    }
}

impl fmt::Display for Position {
    /// Emit the position as a FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                let sq = Square::from_index(rank * 8 + file).unwrap();
                match (self.piece_at(sq), self.color_at(sq)) {
                    (Some(kind), Some(color)) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        let c = match color {
                            Color::White => kind.fen_char().to_ascii_uppercase(),
                            Color::Black => kind.fen_char(),
                        };
                        write!(f, "{c}")?;
                    }
                    _ => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        match self.side_to_move() {
            Color::White => write!(f, " w ")?,
            Color::Black => write!(f, " b ")?,
        }

        if self.castling() == CastleRights::NONE {
            write!(f, "-")?;
        } else {
            for (right, c) in [
                (CastleRights::WHITE_KING, 'K'),
                (CastleRights::WHITE_QUEEN, 'Q'),
                (CastleRights::BLACK_KING, 'k'),
                (CastleRights::BLACK_QUEEN, 'q'),
            ] {
                if self.castling().contains(right) {
                    write!(f, "{c}")?;
                }
            }
        }

        match self.en_passant() {
            Some(sq) => write!(f, " {sq}")?,
            None => write!(f, " -")?,
        }

        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_fen_roundtrip() {
        let pos = Position::starting_position();
        assert_eq!(pos.to_string(), STARTING_FEN);
    }

    #[test]
    fn arbitrary_fen_roundtrip() {
        let fens = [
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
            "8/8/8/8/8/2k5/2R5/K7 w - - 0 1",
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            "r3k2r/8/8/8/8/8/8/R3K2R b Kq - 12 34",
        ];
        for fen in fens {
            let pos: Position = fen.parse().unwrap();
            assert_eq!(pos.to_string(), fen, "roundtrip failed for {fen}");
        }
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = "8/8/8/8/8/8/8/8 w -".parse::<Position>().unwrap_err();
        assert_eq!(err, FenError::WrongFieldCount { found: 3 });
    }

    #[test]
    fn rejects_bad_side() {
        let err = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"
            .parse::<Position>()
            .unwrap_err();
        assert!(matches!(err, FenError::InvalidSideToMove { .. }));
    }

    #[test]
    fn rejects_short_rank() {
        let err = "rnbqkbnr/ppppppp1/7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            .parse::<Position>()
            .unwrap_err();
        assert!(matches!(err, FenError::InvalidPlacement { .. }));
    }

    #[test]
    fn rejects_missing_king() {
        let err = "8/8/8/8/8/8/8/4K3 w - - 0 1".parse::<Position>().unwrap_err();
        assert!(matches!(err, FenError::IllegalPosition { .. }));
    }

    #[test]
    fn rejects_pawn_on_back_rank() {
        let err = "P3k3/8/8/8/8/8/8/4K3 w - - 0 1".parse::<Position>().unwrap_err();
        assert!(matches!(err, FenError::IllegalPosition { .. }));
    }

    #[test]
    fn rejects_bad_en_passant() {
        let err = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1"
            .parse::<Position>()
            .unwrap_err();
        assert!(matches!(err, FenError::InvalidEnPassant { .. }));
    }

    #[test]
    fn parses_no_castling() {
        let pos: Position = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(pos.castling(), CastleRights::NONE);
    }
}
