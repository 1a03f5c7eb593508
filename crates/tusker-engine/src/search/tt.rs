//! Transposition table and hash-move table.
//!
//! Entries live in a hash map behind a mutex: the coarse-critical-section
//! sharing model. Writes always replace at entry granularity; a stale or
//! cross-thread entry can only degrade ordering and pruning, never legality,
//! because alpha-beta re-verifies everything through make-and-test. When the
//! map outgrows [`TT_MAX`] it is cleared outright at the driver's next safe
//! point; there is no finer-grained eviction.

use std::collections::HashMap;
use std::sync::Mutex;

use tusker_core::Move;

use crate::search::MATE_THRESHOLD;

/// Maximum number of stored entries before the table is wiped.
pub const TT_MAX: usize = 10_000_000;

/// Disposition of a stored score relative to the search window it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// True score of a PV node.
    Exact,
    /// Fail-high: the real score is at least this.
    LowerBound,
    /// Fail-low: the real score is at most this.
    UpperBound,
}

/// One transposition table entry.
#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    /// Search score, mate-adjusted relative to this node.
    pub score: i32,
    /// Remaining depth of the search that produced the score.
    pub depth: i16,
    /// How the score relates to the window it was searched with.
    pub bound: Bound,
    /// Best move found, if any move was established.
    pub best_move: Option<Move>,
}

impl TtEntry {
    /// Return the stored score if this entry can answer a probe at the given
    /// depth and window.
    ///
    /// The entry must come from a search at least as deep as requested, and
    /// its bound must be conclusive for the window: exact scores always are,
    /// a lower bound only when it already fails high, an upper bound only
    /// when it already fails low.
    pub fn usable_score(&self, depth: i32, alpha: i32, beta: i32) -> Option<i32> {
        if (self.depth as i32) < depth {
            return None;
        }
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::LowerBound if self.score >= beta => Some(self.score),
            Bound::UpperBound if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Convert a search score to its stored form.
///
/// Mate scores are path-dependent (`MATE - ply` from the root); storing them
/// as distance-from-this-node makes the entry valid from any path.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply
    } else if score < -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Reverse the adjustment applied by [`score_to_tt`].
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply
    } else if score < -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Hash-keyed cache of search results.
pub struct TranspositionTable {
    entries: Mutex<HashMap<u64, TtEntry>>,
}

impl TranspositionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a position, adjusting any mate score to the probing ply.
    pub fn probe(&self, hash: u64, ply: i32) -> Option<TtEntry> {
        let entries = self.entries.lock().expect("tt lock poisoned");
        entries.get(&hash).map(|entry| TtEntry {
            score: score_from_tt(entry.score, ply),
            ..*entry
        })
    }

    /// Store a search result, replacing any previous entry for the hash.
    pub fn store(
        &self,
        hash: u64,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: i32,
    ) {
        let entry = TtEntry {
            score: score_to_tt(score, ply),
            depth: depth.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            bound,
            best_move,
        };
        let mut entries = self.entries.lock().expect("tt lock poisoned");
        entries.insert(hash, entry);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("tt lock poisoned").len()
    }

    /// Return `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, keeping the allocation.
    pub fn clear(&self) {
        self.entries.lock().expect("tt lock poisoned").clear();
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-move-per-position map consulted by move ordering.
///
/// Kept separate from the score entries so ordering probes stay cheap and a
/// replaced score entry does not discard a still-useful hash move.
pub struct HashMoveTable {
    moves: Mutex<HashMap<u64, Move>>,
}

impl HashMoveTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            moves: Mutex::new(HashMap::new()),
        }
    }

    /// Record the best move found for a position.
    pub fn insert(&self, hash: u64, mv: Move) {
        self.moves.lock().expect("hash move lock poisoned").insert(hash, mv);
    }

    /// Look up the remembered best move for a position.
    pub fn get(&self, hash: u64) -> Option<Move> {
        self.moves.lock().expect("hash move lock poisoned").get(&hash).copied()
    }

    /// Number of stored moves.
    pub fn len(&self) -> usize {
        self.moves.lock().expect("hash move lock poisoned").len()
    }

    /// Return `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.moves.lock().expect("hash move lock poisoned").clear();
    }
}

impl Default for HashMoveTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Bound, HashMoveTable, TranspositionTable};
    use crate::search::MATE;
    use tusker_core::{Move, Square};

    #[test]
    fn store_and_probe_roundtrip() {
        let tt = TranspositionTable::new();
        let mv = Move::new(Square::E2, Square::E4);
        tt.store(0xDEAD_BEEF, 5, 120, Bound::Exact, Some(mv), 0);

        let entry = tt.probe(0xDEAD_BEEF, 0).expect("entry stored");
        assert_eq!(entry.score, 120);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, Some(mv));
    }

    #[test]
    fn probe_miss() {
        let tt = TranspositionTable::new();
        assert!(tt.probe(0x1234, 0).is_none());
    }

    #[test]
    fn usable_requires_sufficient_depth() {
        let tt = TranspositionTable::new();
        tt.store(1, 4, 50, Bound::Exact, None, 0);
        let entry = tt.probe(1, 0).unwrap();
        assert_eq!(entry.usable_score(4, -100, 100), Some(50));
        assert_eq!(entry.usable_score(5, -100, 100), None, "stored shallower than requested");
    }

    #[test]
    fn bound_gating() {
        let tt = TranspositionTable::new();
        tt.store(1, 6, 80, Bound::LowerBound, None, 0);
        let entry = tt.probe(1, 0).unwrap();
        // A lower bound of 80 only cuts when beta <= 80.
        assert_eq!(entry.usable_score(6, 0, 70), Some(80));
        assert_eq!(entry.usable_score(6, 0, 100), None);

        tt.store(2, 6, -80, Bound::UpperBound, None, 0);
        let entry = tt.probe(2, 0).unwrap();
        // An upper bound of -80 only answers when alpha >= -80.
        assert_eq!(entry.usable_score(6, -70, 100), Some(-80));
        assert_eq!(entry.usable_score(6, -100, 100), None);
    }

    #[test]
    fn mate_score_ply_adjustment() {
        let tt = TranspositionTable::new();
        // A mate found 3 plies below a node at ply 5 scores MATE - 8 there.
        let score_at_store = MATE - 8;
        tt.store(9, 10, score_at_store, Bound::Exact, None, 5);

        // Probed from ply 2, the same mate is 5 plies closer to this root.
        let entry = tt.probe(9, 2).unwrap();
        assert_eq!(entry.score, MATE - 5);

        // Probed from the original ply the score is unchanged.
        let entry = tt.probe(9, 5).unwrap();
        assert_eq!(entry.score, score_at_store);
    }

    #[test]
    fn negated_mate_adjustment() {
        let tt = TranspositionTable::new();
        tt.store(9, 10, -(MATE - 8), Bound::Exact, None, 5);
        let entry = tt.probe(9, 5).unwrap();
        assert_eq!(entry.score, -(MATE - 8));
    }

    #[test]
    fn always_replace() {
        let tt = TranspositionTable::new();
        tt.store(7, 10, 100, Bound::Exact, None, 0);
        tt.store(7, 2, -30, Bound::UpperBound, None, 0);
        let entry = tt.probe(7, 0).unwrap();
        assert_eq!(entry.depth, 2, "entry replacement is unconditional");
        assert_eq!(entry.score, -30);
    }

    #[test]
    fn clear_empties_table() {
        let tt = TranspositionTable::new();
        tt.store(1, 1, 0, Bound::Exact, None, 0);
        assert_eq!(tt.len(), 1);
        tt.clear();
        assert!(tt.is_empty());
    }

    #[test]
    fn hash_move_table_roundtrip() {
        let hm = HashMoveTable::new();
        let mv = Move::new(Square::G1, Square::F3);
        assert!(hm.get(42).is_none());
        hm.insert(42, mv);
        assert_eq!(hm.get(42), Some(mv));
        hm.clear();
        assert!(hm.is_empty());
    }
}
