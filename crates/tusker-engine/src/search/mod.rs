//! Iterative-deepening search driver and its shared tables.

pub mod classify;
pub mod control;
pub mod heuristics;
pub mod ordering;
pub mod tt;

mod alphabeta;
mod quiescence;

use std::cmp::Reverse;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::debug;

use tusker_core::{legal_moves, Color, Move, Position};

use crate::eval::evaluate;
use self::alphabeta::{alpha_beta, late_move_reduction};
use self::classify::{is_queen_promotion, mate_threat, promotion_threat};
use self::control::SearchControl;
use self::heuristics::{HistoryTable, KillerTable};
use self::ordering::ordered_moves;
use self::tt::{Bound, HashMoveTable, TranspositionTable, TT_MAX};

/// Score bound no search value can reach.
pub const INF: i32 = 100_000;

/// Base score for checkmate; actual mate scores are `MATE - ply`.
pub const MATE: i32 = INF / 2;

/// Scores beyond this threshold are mate scores (the ply offset never
/// exceeds 1000).
pub const MATE_THRESHOLD: i32 = MATE - 1000;

/// Depth ceiling of the engine regardless of time budget.
pub const ENGINE_DEPTH: u32 = 30;

/// Game phase at or below which the position counts as an endgame.
pub(crate) const ENDGAME_PHASE: i32 = 12;

/// Selective-extension budget handed to each root-move task.
const EXTENSION_BUDGET: i32 = 4;

/// Initial half-width of the root aspiration window, in centipawns.
const ASPIRATION_HALF_WIDTH: i32 = 50;

/// Two iteration scores within this margin count as agreeing.
const STABLE_MARGIN: i32 = 25;

/// Everything a search thread needs, shared by reference across workers.
pub(crate) struct SearchShared<'a> {
    pub tt: &'a TranspositionTable,
    pub hash_moves: &'a HashMoveTable,
    pub killers: &'a KillerTable,
    pub history: &'a HistoryTable,
    pub nodes: &'a AtomicU64,
    pub control: &'a SearchControl,
    pub prev_pv: &'a [Move],
    pub q_depth: i32,
    pub mop_up: bool,
}

/// Tunable parameters for one search call.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Number of worker threads splitting the root moves.
    pub threads: usize,
    /// Iterative-deepening ceiling.
    pub max_depth: u32,
    /// Quiescence depth cap.
    pub q_depth: i32,
    /// Suppress per-iteration progress callbacks.
    pub quiet: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            threads: 4,
            max_depth: ENGINE_DEPTH,
            q_depth: 10,
            quiet: false,
        }
    }
}

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move at the highest completed depth; null on terminal positions.
    pub best_move: Move,
    /// Score of the best move in centipawns, side-to-move perspective.
    pub score: i32,
    /// Principal variation of the last completed iteration.
    pub pv: Vec<Move>,
    /// Total nodes visited across all iterations.
    pub nodes: u64,
    /// Deepest fully completed iteration.
    pub depth: u32,
}

/// Best root line found by the workers of one iteration.
struct RoundState {
    best_score: i32,
    best_move: Move,
    pv: Vec<Move>,
    results: Vec<(Move, i32)>,
}

impl RoundState {
    fn new(capacity: usize) -> Self {
        Self {
            best_score: -INF,
            best_move: Move::NULL,
            pv: Vec::new(),
            results: Vec::with_capacity(capacity),
        }
    }
}

/// Iterative-deepening searcher owning the tables that persist across calls.
///
/// The transposition table, hash-move table, and history survive from move to
/// move within a game; [`new_game`](Searcher::new_game) resets them. Killers
/// and the previous-iteration PV are rebuilt per call.
pub struct Searcher {
    tt: TranspositionTable,
    hash_moves: HashMoveTable,
    killers: KillerTable,
    history: HistoryTable,
}

impl Searcher {
    /// Create a searcher with empty tables.
    pub fn new() -> Self {
        Self {
            tt: TranspositionTable::new(),
            hash_moves: HashMoveTable::new(),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
        }
    }

    /// Reset all persistent state (new game).
    pub fn new_game(&self) {
        self.tt.clear();
        self.hash_moves.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Drop oversized caches. Called at the safe points around a search.
    fn sweep_tables(&self) {
        if self.tt.len() > TT_MAX {
            debug!(entries = self.tt.len(), "transposition table over capacity, clearing");
            self.tt.clear();
            self.hash_moves.clear();
        }
    }

    /// Select a best move within the given limits.
    ///
    /// Runs iterative deepening with the root moves of each depth split
    /// across `params.threads` workers, calling
    /// `on_iter(depth, score, nodes, pv)` after every completed iteration
    /// unless `params.quiet` is set. Returns [`Move::NULL`] as best move when
    /// the position is already decided.
    pub fn find_best_move<F>(
        &self,
        pos: &Position,
        params: &SearchParams,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(u32, i32, u64, &[Move]),
    {
        let root_moves = legal_moves(pos);
        if root_moves.is_empty() {
            let score = if pos.in_check() { -MATE } else { 0 };
            return SearchResult {
                best_move: Move::NULL,
                score,
                pv: Vec::new(),
                nodes: 0,
                depth: 0,
            };
        }

        // A side reduced to its bare king flips on mop-up play: reductions
        // and pruning are suspended so lone-king mates are actually driven
        // home. Recomputed fresh on every call.
        let mop_up = pos.side(Color::White).count() == 1 || pos.side(Color::Black).count() == 1;

        self.sweep_tables();
        self.killers.clear();

        let static_eval = evaluate(pos);
        let threads = params.threads.max(1);
        let max_depth = params.max_depth.max(1);

        let mut prev_pv: Vec<Move> = Vec::new();
        let mut evals: Vec<i32> = Vec::new();
        let mut moves: Vec<(Move, i32)> = Vec::new();
        let mut best_move = Move::NULL;
        let mut best_score = -INF;
        let mut completed_depth = 0;
        let mut total_nodes = 0u64;

        for depth in 1..=max_depth {
            if control.aborted() {
                break;
            }

            let iter_nodes = AtomicU64::new(0);
            let shared = SearchShared {
                tt: &self.tt,
                hash_moves: &self.hash_moves,
                killers: &self.killers,
                history: &self.history,
                nodes: &iter_nodes,
                control,
                prev_pv: &prev_pv,
                q_depth: params.q_depth,
                mop_up,
            };

            // Depth 1 orders the raw move list; later depths reuse the
            // previous iteration's list, already sorted by score.
            if depth == 1 {
                moves = ordered_moves(pos, 0, &shared, false);
            }

            // Aspiration center: the previous iteration's score, or the
            // static evaluation when there is none yet.
            let center = evals.last().copied().unwrap_or(static_eval);

            let cursor = AtomicUsize::new(0);
            let round = Mutex::new(RoundState::new(moves.len()));
            let workers = threads.min(moves.len());

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|| {
                        search_root_moves(
                            pos,
                            depth as i32,
                            center,
                            &moves,
                            &cursor,
                            &round,
                            &shared,
                        );
                    });
                }
            });

            let round = round.into_inner().expect("round lock poisoned");
            total_nodes += iter_nodes.load(Ordering::Relaxed);

            // A worker that aborted mid-move leaves a gap; the iteration is
            // incomplete and its results are discarded.
            if round.results.len() < moves.len() {
                debug!(depth, "iteration aborted, keeping previous result");
                break;
            }

            best_move = round.best_move;
            best_score = round.best_score;
            prev_pv = round.pv;
            completed_depth = depth;
            evals.push(best_score);

            moves = round.results;
            moves.sort_by_key(|&(_, score)| Reverse(score));

            self.tt
                .store(pos.hash(), depth as i32, best_score, Bound::Exact, Some(best_move), 0);

            if !params.quiet {
                on_iter(depth, best_score, iter_nodes.load(Ordering::Relaxed), &prev_pv);
            }

            // A forced reply needs no deeper look.
            if moves.len() == 1 {
                break;
            }

            // Termination: keep deepening while inside the budget. Once over
            // it, stop on a stable score, a hard overrun, or the depth
            // ceiling; otherwise grant one more iteration.
            if !control.budget_exceeded() {
                continue;
            }
            if stable_evals(&evals) {
                break;
            }
            if depth > ENGINE_DEPTH || control.overtime() {
                break;
            }
        }

        self.sweep_tables();

        // If not even depth 1 completed, fall back to the best-ordered move
        // rather than returning no move at all.
        if best_move.is_null() {
            best_move = moves.first().map_or(root_moves[0], |&(mv, _)| mv);
            best_score = static_eval;
        }

        SearchResult {
            best_move,
            score: best_score,
            pv: if prev_pv.is_empty() { vec![best_move] } else { prev_pv },
            nodes: total_nodes,
            depth: completed_depth,
        }
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("tt_entries", &self.tt.len())
            .finish()
    }
}

/// The last four iteration scores all agree within [`STABLE_MARGIN`].
fn stable_evals(evals: &[i32]) -> bool {
    if evals.len() < 4 {
        return false;
    }
    let tail = &evals[evals.len() - 4..];
    let max = tail.iter().max().expect("tail is nonempty");
    let min = tail.iter().min().expect("tail is nonempty");
    max - min <= STABLE_MARGIN
}

/// Worker loop: repeatedly claim the next unsearched root move and search it
/// with an aspiration window.
///
/// Work stealing is a shared cursor over the ordered root move list, one
/// move per claim. The wall clock is consulted between claims; an abort
/// mid-move drops the result, which the driver detects as a gap.
fn search_root_moves(
    pos: &Position,
    depth: i32,
    center: i32,
    moves: &[(Move, i32)],
    cursor: &AtomicUsize,
    round: &Mutex<RoundState>,
    shared: &SearchShared<'_>,
) {
    loop {
        if shared.control.aborted() {
            break;
        }
        if shared.control.overtime() {
            shared.control.request_stop();
            break;
        }

        let index = cursor.fetch_add(1, Ordering::Relaxed);
        if index >= moves.len() {
            break;
        }
        let (mv, _) = moves[index];
        let left_most = index == 0;
        let mut extension = EXTENSION_BUDGET;

        let child = pos.make_move(mv);

        // Root-move extension and reduction flags, mirroring the inner move
        // loop.
        let checks_enemy = child.in_check();
        let threat_mate = mate_threat(pos, mv);
        let threat_promo = promotion_threat(pos, mv);
        let mut extend = 0;
        if extension > 0 && (checks_enemy || threat_mate || threat_promo || moves.len() == 1) {
            extension -= 1;
            extend = 1;
        }
        let no_reduce = shared.mop_up || is_queen_promotion(mv) || threat_mate || threat_promo;
        let reduce_less = checks_enemy || pos.in_check() || pos.is_capture(mv);
        let next_depth = late_move_reduction(index, depth, true, no_reduce, reduce_less) + extend;

        // Aspiration: search in a narrow window around the center, doubling
        // the failed side until the score fits.
        let mut low = ASPIRATION_HALF_WIDTH;
        let mut high = ASPIRATION_HALF_WIDTH;
        let mut child_pv = Vec::new();
        let mut score;
        loop {
            let alpha = (center - low).max(-INF);
            let beta = (center + high).min(INF);
            child_pv.clear();
            score = -alpha_beta(
                &child,
                next_depth,
                1,
                -beta,
                -alpha,
                &mut child_pv,
                left_most,
                extension,
                shared,
            );
            if shared.control.aborted() {
                return;
            }
            if score <= center - low {
                low *= 2;
            } else if score >= center + high {
                high *= 2;
            } else {
                break;
            }
        }

        // A reduced root search that would take the lead is repeated at full
        // depth with a full window before it is believed.
        let takes_lead = {
            let round = round.lock().expect("round lock poisoned");
            score > round.best_score
        };
        if takes_lead && next_depth < depth - 1 {
            child_pv.clear();
            score = -alpha_beta(
                &child,
                depth - 1,
                1,
                -INF,
                INF,
                &mut child_pv,
                left_most,
                extension,
                shared,
            );
            if shared.control.aborted() {
                return;
            }
        }

        let mut round = round.lock().expect("round lock poisoned");
        round.results.push((mv, score));
        if score > round.best_score {
            round.best_score = score;
            round.best_move = mv;
            round.pv = std::iter::once(mv).chain(child_pv.iter().copied()).collect();
        }
    }
}
