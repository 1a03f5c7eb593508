//! Move ordering.
//!
//! Priority bands, highest first:
//!
//! | Category                  | Priority          |
//! |---------------------------|-------------------|
//! | Previous-iteration PV move| 10,000            |
//! | Hash-table best move      | 9,000             |
//! | Queen promotion           | 6,000             |
//! | Capture                   | 4000 + MVV-LVA    |
//! | Check-giving move         | 3,000             |
//! | Killer move               | 2,000             |
//! | Quiet move                | history score     |
//!
//! Noisy moves (everything above quiet) sort descending by priority; quiet
//! moves follow, sorted by history. Both sorts are stable, so ties keep
//! generation order and single-threaded searches are reproducible.

use std::cmp::Reverse;

use tusker_core::{legal_moves, Move, Position};

use crate::search::classify::{gives_check, is_queen_promotion, mvv_lva};
use crate::search::SearchShared;

/// Priority of the previous iteration's PV move on the left spine.
pub const PRIORITY_PV: i32 = 10_000;
/// Priority of the hash-move table's best move.
pub const PRIORITY_HASH: i32 = 9_000;
/// Priority of queen promotions.
pub const PRIORITY_QUEEN_PROMOTION: i32 = 6_000;
/// Priority of check-giving moves.
pub const PRIORITY_CHECK: i32 = 3_000;
/// Priority of killer moves.
pub const PRIORITY_KILLER: i32 = 2_000;

/// Produce the legal moves of `pos` ordered for search at the given ply.
///
/// `left_most` marks nodes on the leftmost spine of the tree, where the
/// previous iteration's PV move is pulled to the front.
pub(crate) fn ordered_moves(
    pos: &Position,
    ply: usize,
    shared: &SearchShared<'_>,
    left_most: bool,
) -> Vec<(Move, i32)> {
    let moves = legal_moves(pos);
    let us = pos.side_to_move();
    let hash_move = shared.hash_moves.get(pos.hash());
    let pv_move = if left_most {
        shared.prev_pv.get(ply).copied()
    } else {
        None
    };

    let mut noisy: Vec<(Move, i32)> = Vec::with_capacity(moves.len());
    let mut quiet: Vec<(Move, i32)> = Vec::with_capacity(moves.len());

    for &mv in &moves {
        if pv_move == Some(mv) {
            noisy.push((mv, PRIORITY_PV));
        } else if hash_move == Some(mv) {
            noisy.push((mv, PRIORITY_HASH));
        } else if is_queen_promotion(mv) {
            noisy.push((mv, PRIORITY_QUEEN_PROMOTION));
        } else if pos.is_capture(mv) {
            noisy.push((mv, mvv_lva(pos, mv)));
        } else if gives_check(pos, mv) {
            noisy.push((mv, PRIORITY_CHECK));
        } else if shared.killers.is_killer(ply, mv) {
            noisy.push((mv, PRIORITY_KILLER));
        } else {
            quiet.push((mv, shared.history.score(us, mv)));
        }
    }

    noisy.sort_by_key(|&(_, priority)| Reverse(priority));
    quiet.sort_by_key(|&(_, priority)| Reverse(priority));
    noisy.extend(quiet);
    noisy
}
