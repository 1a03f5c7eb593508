//! Core parsing errors.

/// Errors produced when parsing a FEN string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FenError {
    /// The FEN does not have the required six fields.
    #[error("FEN must have 6 fields, found {found}")]
    WrongFieldCount {
        /// Number of whitespace-separated fields found.
        found: usize,
    },

    /// The piece placement field is malformed.
    #[error("invalid piece placement: {reason}")]
    InvalidPlacement {
        /// Human-readable description of the defect.
        reason: &'static str,
    },

    /// The side-to-move field is not `w` or `b`.
    #[error("invalid side to move: {field}")]
    InvalidSideToMove {
        /// The offending field.
        field: String,
    },

    /// The castling field contains an unknown character.
    #[error("invalid castling rights: {field}")]
    InvalidCastling {
        /// The offending field.
        field: String,
    },

    /// The en passant field is not `-` or a valid square.
    #[error("invalid en passant target: {field}")]
    InvalidEnPassant {
        /// The offending field.
        field: String,
    },

    /// A move counter is not a number.
    #[error("invalid move counter: {field}")]
    InvalidCounter {
        /// The offending field.
        field: String,
    },

    /// The resulting position is structurally impossible.
    #[error("illegal position: {reason}")]
    IllegalPosition {
        /// Human-readable description of the defect.
        reason: &'static str,
    },
}
