//! Move classification: cheap tactical predicates used by ordering,
//! reductions, and extensions.

use tusker_core::{legal_moves, Color, Move, PieceKind, Position, PromotionPiece};

use crate::eval::endgame::is_passed_pawn;
use crate::eval::material::piece_value;

/// MVV-LVA priority for a capture: a band base plus victim value minus
/// attacker value, so PxQ outranks QxP.
///
/// En passant captures score as pawn-takes-pawn.
pub fn mvv_lva(pos: &Position, mv: Move) -> i32 {
    let attacker = pos
        .piece_at(mv.source())
        .map_or(piece_value(PieceKind::Pawn), piece_value);
    let victim = if mv.is_en_passant() {
        piece_value(PieceKind::Pawn)
    } else {
        pos.piece_at(mv.dest()).map_or(0, piece_value)
    };
    4000 + victim - attacker
}

/// Raw material swing of a noisy move, without the ordering band.
///
/// Used by delta pruning in quiescence: victim value for captures, plus the
/// upgrade value for promotions.
pub fn material_gain(pos: &Position, mv: Move) -> i32 {
    let mut gain = if mv.is_en_passant() {
        piece_value(PieceKind::Pawn)
    } else {
        pos.piece_at(mv.dest()).map_or(0, piece_value)
    };
    if mv.is_promotion() {
        gain += piece_value(mv.promotion_piece().to_piece_kind()) - piece_value(PieceKind::Pawn);
    }
    gain
}

/// Return `true` if the move promotes to a queen.
///
/// Underpromotions are deliberately excluded; they order as quiet moves.
pub fn is_queen_promotion(mv: Move) -> bool {
    mv.is_promotion() && mv.promotion_piece() == PromotionPiece::Queen
}

/// Return `true` if the move gives check.
pub fn gives_check(pos: &Position, mv: Move) -> bool {
    pos.make_move(mv).in_check()
}

/// Heuristic mate-threat test. Cheap, not a tactical proof.
///
/// Fires when the move lands near the enemy king, or when a rook or queen
/// arrives on a file and rank both adjacent to it.
pub fn mate_threat(pos: &Position, mv: Move) -> bool {
    let their_king = pos.king_square(pos.side_to_move().flip());
    let dest = mv.dest();

    if dest.manhattan_distance(their_king) <= 3 {
        return true;
    }

    if matches!(
        pos.piece_at(mv.source()),
        Some(PieceKind::Rook) | Some(PieceKind::Queen)
    ) {
        let file_diff = (dest.file().index() as i32 - their_king.file().index() as i32).abs();
        let rank_diff = (dest.rank().index() as i32 - their_king.rank().index() as i32).abs();
        if file_diff <= 1 && rank_diff <= 1 {
            return true;
        }
    }

    false
}

/// Return `true` if the move pushes a passed pawn beyond its fourth rank.
pub fn promotion_threat(pos: &Position, mv: Move) -> bool {
    let us = pos.side_to_move();
    if pos.piece_at(mv.source()) != Some(PieceKind::Pawn) {
        return false;
    }

    let dest = mv.dest();
    let enemy_pawns = pos.pieces(PieceKind::Pawn) & pos.side(us.flip());
    if !is_passed_pawn(dest, us, enemy_pawns) {
        return false;
    }

    match us {
        Color::White => dest.rank().index() > 3,
        Color::Black => dest.rank().index() < 4,
    }
}

/// Return `true` if the position has exactly one legal move.
pub fn one_reply(pos: &Position) -> bool {
    legal_moves(pos).len() == 1
}
