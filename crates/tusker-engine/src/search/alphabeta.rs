//! The recursive negamax alpha-beta search with pruning, reductions, and
//! selective extensions.

use std::sync::atomic::Ordering;

use tusker_core::{GameStatus, Move, Position};

use crate::eval::evaluate;
use crate::search::classify::{is_queen_promotion, mate_threat, promotion_threat};
use crate::search::ordering::ordered_moves;
use crate::search::quiescence::quiescence;
use crate::search::tt::Bound;
use crate::search::{SearchShared, ENDGAME_PHASE, INF, MATE};

/// Futility margin per remaining ply.
const FUTILITY_MARGIN: i32 = 130;

/// Late move reduction: how deep to search the `index`-th ordered move.
///
/// The first few moves and shallow nodes search at full depth; later moves
/// lose one ply, and the tail of a non-PV move list loses two. `no_reduce`
/// exempts tactical moves entirely, `reduce_less` caps the reduction at one
/// ply.
pub(crate) fn late_move_reduction(
    index: usize,
    depth: i32,
    is_pv: bool,
    no_reduce: bool,
    reduce_less: bool,
) -> i32 {
    let full_window = if is_pv { 2 } else { 1 };
    let half_window = if is_pv { 5 } else { 3 };

    if index <= full_window || depth <= 3 || no_reduce {
        depth - 1
    } else if index <= half_window || reduce_less {
        depth - 2
    } else {
        depth - 3
    }
}

/// Negamax alpha-beta.
///
/// Returns the score of `pos` from the side-to-move's perspective and fills
/// `pv` with the principal variation whenever a move raises alpha. `ply` is
/// the distance from the root of this search call, `left_most` marks the
/// leftmost spine (searched with a full window and guided by the previous
/// iteration's PV), and `extension` is the remaining selective-extension
/// budget for this path.
#[allow(clippy::too_many_arguments)]
pub(crate) fn alpha_beta(
    pos: &Position,
    depth: i32,
    ply: i32,
    mut alpha: i32,
    beta: i32,
    pv: &mut Vec<Move>,
    mut left_most: bool,
    mut extension: i32,
    shared: &SearchShared<'_>,
) -> i32 {
    let nodes = shared.nodes.fetch_add(1, Ordering::Relaxed) + 1;
    if shared.control.should_abort(nodes) {
        return alpha;
    }

    match pos.game_over() {
        GameStatus::Checkmate => return -(MATE - ply),
        GameStatus::Draw => return 0,
        GameStatus::Ongoing => {}
    }

    let hash = pos.hash();
    if let Some(entry) = shared.tt.probe(hash, ply) {
        if let Some(score) = entry.usable_score(depth, alpha, beta) {
            return score;
        }
    }

    if depth <= 0 {
        let score = quiescence(pos, shared.q_depth, alpha, beta, 0, shared);
        shared.tt.store(hash, 0, score, Bound::Exact, None, ply);
        return score;
    }

    let in_check = pos.in_check();
    let endgame = pos.phase() <= ENDGAME_PHASE;
    let is_pv = alpha < beta - 1;
    let stand_pat = evaluate(pos);

    // Pruning is suspended in check, in mop-up and endgame play, and near
    // mate scores, where static margins stop being meaningful.
    let pruning_ok = !in_check && !shared.mop_up && !endgame && alpha < MATE / 4;

    // Futility: a static eval this far above beta at a shallow node is
    // assumed to hold.
    if depth < 3 && pruning_ok {
        let margin = depth * FUTILITY_MARGIN;
        if stand_pat - margin > beta {
            return stand_pat - margin;
        }
    }

    // Razoring: a static eval hopelessly below alpha drops straight into
    // quiescence instead of a full shallow search.
    if depth <= 3 && pruning_ok && !is_pv {
        let razor_margin = 300 + (depth - 1) * 60;
        if stand_pat + razor_margin < alpha {
            return quiescence(pos, shared.q_depth, alpha, beta, 0, shared);
        }
    }

    // Null move: hand the opponent a free move; if the reduced search still
    // fails high, the position is good enough to cut. Unsound in the endgame
    // (zugzwang) and never on the PV spine.
    if depth >= 4 && !endgame && !left_most && !in_check {
        let reduction = 3 + depth / 4;
        let null_pos = pos.make_null();
        let mut null_pv = Vec::new();
        let null_score = -alpha_beta(
            &null_pos,
            depth - reduction,
            ply + 1,
            -beta,
            -beta + 1,
            &mut null_pv,
            false,
            extension,
            shared,
        );
        if null_score >= beta {
            return beta;
        }
    }

    let moves = ordered_moves(pos, ply as usize, shared, left_most);
    let single_reply = moves.len() == 1;
    let original_alpha = alpha;
    let mut best = -INF;
    let mut best_move: Option<Move> = None;

    for (i, &(mv, _priority)) in moves.iter().enumerate() {
        if i > 0 {
            left_most = false;
        }

        let capture = pos.is_capture(mv);
        let queen_promo = is_queen_promotion(mv);
        let threat_mate = mate_threat(pos, mv);
        let threat_promo = promotion_threat(pos, mv);

        let child = pos.make_move(mv);
        let checks_enemy = child.in_check();

        // Selective extensions, capped by the per-path budget. Every
        // category extends one ply.
        let mut extend = 0;
        if extension > 0 && (checks_enemy || threat_mate || threat_promo || single_reply) {
            extension -= 1;
            extend = 1;
        }

        let no_reduce = shared.mop_up || queen_promo || threat_mate || threat_promo;
        let reduce_less = checks_enemy || in_check || capture;
        let next_depth = late_move_reduction(i, depth, is_pv, no_reduce, reduce_less) + extend;

        let mut child_pv = Vec::new();
        let score = if left_most || is_pv {
            -alpha_beta(
                &child,
                depth - 1,
                ply + 1,
                -beta,
                -alpha,
                &mut child_pv,
                left_most,
                extension,
                shared,
            )
        } else {
            // Null-window scout at the (possibly reduced) depth, then a full
            // re-search whenever the reduced line would raise alpha.
            let mut score = -alpha_beta(
                &child,
                next_depth,
                ply + 1,
                -alpha - 1,
                -alpha,
                &mut child_pv,
                false,
                extension,
                shared,
            );
            if score > alpha && next_depth < depth - 1 {
                child_pv.clear();
                score = -alpha_beta(
                    &child,
                    depth - 1,
                    ply + 1,
                    -beta,
                    -alpha,
                    &mut child_pv,
                    false,
                    extension,
                    shared,
                );
            }
            score
        };

        if score > best {
            best = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
            pv.clear();
            pv.push(mv);
            pv.extend_from_slice(&child_pv);
        }
        if alpha >= beta {
            if !capture {
                shared.killers.store(ply as usize, mv);
                shared.history.bump(pos.side_to_move(), mv, depth);
            }
            break;
        }
    }

    // An aborted search returns whatever it has without polluting the tables.
    if shared.control.aborted() {
        return best;
    }

    if let Some(bm) = best_move {
        let bound = if best >= beta {
            Bound::LowerBound
        } else if best <= original_alpha {
            Bound::UpperBound
        } else {
            Bound::Exact
        };
        shared.tt.store(hash, depth, best, bound, Some(bm), ply);
        if !pv.is_empty() {
            shared.hash_moves.insert(hash, pv[0]);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::alpha_beta;
    use crate::search::test_support::Fixture;
    use crate::search::{INF, MATE};
    use tusker_core::{legal_moves, Position};

    fn search(fixture: &Fixture, pos: &Position, depth: i32) -> (i32, Vec<tusker_core::Move>) {
        let mut pv = Vec::new();
        let score = alpha_beta(pos, depth, 0, -INF, INF, &mut pv, true, 4, &fixture.shared());
        (score, pv)
    }

    #[test]
    fn already_checkmated_scores_negative_mate() {
        let fixture = Fixture::new();
        let pos: Position = "7k/6Q1/5K2/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let (score, _) = search(&fixture, &pos, 3);
        assert_eq!(score, -MATE);
    }

    #[test]
    fn stalemate_scores_zero() {
        let fixture = Fixture::new();
        let pos: Position = "k7/2K5/1Q6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let (score, _) = search(&fixture, &pos, 3);
        assert_eq!(score, 0);
    }

    #[test]
    fn finds_mate_in_one() {
        let fixture = Fixture::new();
        // Back-rank mate: Ra1-a8.
        let pos: Position = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1".parse().unwrap();
        let (score, pv) = search(&fixture, &pos, 3);
        assert_eq!(score, MATE - 1, "mate in one scores MATE - 1");
        assert_eq!(pv[0].to_uci(), "a1a8");
    }

    #[test]
    fn mate_score_prefers_shorter_mate() {
        let fixture = Fixture::new();
        // K+R vs K with a forced mate in two: 1.Kg6 Kg8 2.Ra8#.
        let pos: Position = "7k/8/5K2/8/8/8/8/R7 w - - 0 1".parse().unwrap();
        let (score, _) = search(&fixture, &pos, 6);
        assert!(
            score >= MATE - 4,
            "mate in two plies of our moves scores at least MATE - 4, got {score}"
        );
    }

    #[test]
    fn pv_first_move_is_legal() {
        let fixture = Fixture::new();
        let pos = Position::starting_position();
        let (_, pv) = search(&fixture, &pos, 4);
        assert!(!pv.is_empty());
        let legal = legal_moves(&pos);
        assert!(legal.iter().any(|&m| m == pv[0]));
    }

    #[test]
    fn score_stays_in_band() {
        let fixture = Fixture::new();
        let pos: Position = "r1bqkbnr/pppppppp/2n5/8/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 1"
            .parse()
            .unwrap();
        let (score, _) = search(&fixture, &pos, 4);
        assert!(score.abs() <= INF / 2);
    }

    #[test]
    fn depth_zero_matches_quiescence() {
        use crate::search::quiescence::quiescence;
        let fixture = Fixture::new();
        let pos: Position = "4k3/8/8/4p3/3Q4/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut pv = Vec::new();
        let ab_score = alpha_beta(&pos, 0, 0, -INF, INF, &mut pv, false, 4, &fixture.shared());

        let fixture2 = Fixture::new();
        let q_score = quiescence(&pos, fixture2.shared().q_depth, -INF, INF, 0, &fixture2.shared());
        assert_eq!(ab_score, q_score);
    }

    #[test]
    fn avoids_stalemating_a_won_position() {
        let fixture = Fixture::new();
        // White to move: Qg6 stalemates, Qh7 mates. Any reasonable depth must
        // pick a move keeping the win alive.
        let pos: Position = "7k/8/6KQ/8/8/8/8/8 w - - 0 1".parse().unwrap();
        let (score, pv) = search(&fixture, &pos, 4);
        assert!(score > MATE / 2, "winning side must see the mate, got {score}");
        assert_ne!(pv[0].to_uci(), "h6g6", "stalemating throws away the win");
    }

    #[test]
    fn deeper_search_reuses_tt_without_corruption() {
        let fixture = Fixture::new();
        let pos: Position = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4"
            .parse()
            .unwrap();
        let (first, _) = search(&fixture, &pos, 2);
        let (second, pv) = search(&fixture, &pos, 4);
        assert!(first > MATE / 2 && second > MATE / 2);
        assert_eq!(pv[0].to_uci(), "h5f7", "Qxf7# is mate in one");
    }
}
