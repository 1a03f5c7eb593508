//! Killer move and history tables.
//!
//! Both tables are shared by the root workers of a parallel search, so they
//! synchronize internally with a mutex. Lost updates under contention only
//! perturb move ordering, never legality.

use std::sync::Mutex;

use tusker_core::{Color, Move};

/// Maximum search ply tracked by the killer table.
pub const MAX_PLY: usize = 64;

/// History scores saturate below this cap.
pub const HISTORY_CAP: i32 = 1 << 24;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: Mutex<[[Move; 2]; MAX_PLY]>,
}

impl KillerTable {
    /// Create an empty killer table.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new([[Move::NULL; 2]; MAX_PLY]),
        }
    }

    /// Record a quiet cutoff move at the given ply.
    ///
    /// The newest killer takes slot 0 and the previous one shifts to slot 1.
    /// Storing a move already in slot 0 is a no-op, which keeps the two slots
    /// distinct and makes duplicate inserts from concurrent workers harmless.
    pub fn store(&self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let mut slots = self.slots.lock().expect("killer table lock poisoned");
        if slots[ply][0] != mv {
            slots[ply][1] = slots[ply][0];
            slots[ply][0] = mv;
        }
    }

    /// Return `true` if the move is a killer at the given ply.
    pub fn is_killer(&self, ply: usize, mv: Move) -> bool {
        if ply >= MAX_PLY {
            return false;
        }
        let slots = self.slots.lock().expect("killer table lock poisoned");
        slots[ply][0] == mv || slots[ply][1] == mv
    }

    /// Forget all killers.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().expect("killer table lock poisoned");
        *slots = [[Move::NULL; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Butterfly history: one 64x64 (from, to) table per side.
///
/// Quiet moves that cause beta cutoffs earn `depth²`; the counters bias quiet
/// move ordering and are reset only on an explicit new-game request, never
/// between searches of the same game.
pub struct HistoryTable {
    table: Mutex<Box<[[[i32; 64]; 64]; 2]>>,
}

impl HistoryTable {
    /// Create a zeroed history table.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Box::new([[[0; 64]; 64]; 2])),
        }
    }

    /// Credit a quiet move that caused a beta cutoff at the given depth.
    pub fn bump(&self, side: Color, mv: Move, depth: i32) {
        let bonus = depth * depth;
        let mut table = self.table.lock().expect("history table lock poisoned");
        let entry = &mut table[side.index()][mv.source().index()][mv.dest().index()];
        *entry = (*entry + bonus).min(HISTORY_CAP);
    }

    /// Ordering score for a quiet move.
    pub fn score(&self, side: Color, mv: Move) -> i32 {
        let table = self.table.lock().expect("history table lock poisoned");
        table[side.index()][mv.source().index()][mv.dest().index()]
    }

    /// Reset all counters (new game).
    pub fn clear(&self) {
        let mut table = self.table.lock().expect("history table lock poisoned");
        **table = [[[0; 64]; 64]; 2];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}
