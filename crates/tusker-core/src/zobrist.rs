//! Zobrist hashing keys, generated at compile time from a fixed seed.

use crate::color::Color;
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

const SEED: u64 = 0x5455_534b_4552_2121; // "TUSKER!!"

/// Xorshift64 PRNG step. Returns (value, next state).
const fn xorshift64(mut state: u64) -> (u64, u64) {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    (state, state)
}

/// Advance the generator `n` steps from the seed.
const fn state_after(n: usize) -> u64 {
    let mut state = SEED;
    let mut i = 0;
    while i < n {
        let (_, next) = xorshift64(state);
        state = next;
        i += 1;
    }
    state
}

/// Key for each (color, piece kind, square) triple.
pub(crate) static PIECE_SQUARE: [[[u64; 64]; 6]; 2] = {
    let mut table = [[[0u64; 64]; 6]; 2];
    let mut state = SEED;
    let mut color = 0;
    while color < 2 {
        let mut kind = 0;
        while kind < 6 {
            let mut sq = 0;
            while sq < 64 {
                let (val, next) = xorshift64(state);
                table[color][kind][sq] = val;
                state = next;
                sq += 1;
            }
            kind += 1;
        }
        color += 1;
    }
    table
};

/// Key XORed in when Black is the side to move.
pub(crate) static SIDE_TO_MOVE: u64 = {
    let (val, _) = xorshift64(state_after(768));
    val
};

/// Keys for castling configurations, indexed by `CastleRights::bits()`.
pub(crate) static CASTLING: [u64; 16] = {
    let mut table = [0u64; 16];
    let mut state = state_after(769);
    let mut i = 0;
    while i < 16 {
        let (val, next) = xorshift64(state);
        table[i] = val;
        state = next;
        i += 1;
    }
    table
};

/// Keys for the en passant file, indexed by `File::index()`.
pub(crate) static EN_PASSANT_FILE: [u64; 8] = {
    let mut table = [0u64; 8];
    let mut state = state_after(785);
    let mut i = 0;
    while i < 8 {
        let (val, next) = xorshift64(state);
        table[i] = val;
        state = next;
        i += 1;
    }
    table
};

/// Key for one piece on one square.
#[inline]
pub(crate) fn piece_key(color: Color, kind: PieceKind, sq: Square) -> u64 {
    PIECE_SQUARE[color.index()][kind.index()][sq.index()]
}

/// Compute the hash of a position from scratch.
///
/// Used when constructing positions (start position, FEN); moves maintain the
/// hash incrementally.
pub(crate) fn hash_from_scratch(pos: &Position) -> u64 {
    let mut hash = 0u64;

    for color in Color::ALL {
        for kind in PieceKind::ALL {
            for sq in pos.pieces(kind) & pos.side(color) {
                hash ^= piece_key(color, kind, sq);
            }
        }
    }

    if pos.side_to_move() == Color::Black {
        hash ^= SIDE_TO_MOVE;
    }

    hash ^= CASTLING[pos.castling().bits() as usize];

    if let Some(ep) = pos.en_passant() {
        hash ^= EN_PASSANT_FILE[ep.file().index()];
    }

    hash
}
