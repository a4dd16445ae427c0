//! Error types for FEN parsing, notation handling, and promotion.
//!
//! Every error carries a machine-identifiable reason with its parameters;
//! the `Display` strings are conveniences, not the contract, so callers
//! can localize from the variants alone.

use thiserror::Error;

use crate::castle_rights::CastleSide;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// Errors that occur when parsing a FEN string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    /// The FEN string does not have exactly 6 whitespace-separated fields.
    #[error("expected 6 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// The piece placement does not have exactly 8 ranks.
    #[error("expected 8 ranks in piece placement, found {found}")]
    WrongRankCount {
        /// Number of ranks found.
        found: usize,
    },
    /// A rank in the piece placement describes more or fewer than 8 squares.
    #[error("rank {rank_index} describes {width} squares, expected 8")]
    BadRankLength {
        /// Zero-based rank index (0 = rank 8 in FEN, 7 = rank 1).
        rank_index: usize,
        /// Number of squares described.
        width: usize,
    },
    /// An unrecognized character appeared in the piece placement.
    #[error("invalid piece character: '{character}'")]
    InvalidPieceChar { character: char },
    /// The active color field is not "w" or "b".
    #[error("invalid active color: \"{found}\"")]
    InvalidTurn { found: String },
    /// An unrecognized character appeared in the castling field.
    #[error("invalid castling character: '{character}'")]
    InvalidCastlingChar { character: char },
    /// Strict mode: the castling field is not in canonical `KQkq` order.
    #[error("castling field \"{found}\" is not in canonical order")]
    NonCanonicalCastling { found: String },
    /// The en passant field is not "-" or a square on rank 3 or 6.
    #[error("invalid en passant square: \"{found}\"")]
    InvalidEnPassant { found: String },
    /// Strict mode: the en passant rank does not match the side to move.
    #[error("en passant square \"{found}\" does not match the side to move")]
    EnPassantRankMismatch { found: String },
    /// A move counter is not a valid number (or, strictly, not positive for
    /// the full-move number).
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// The field name ("halfmove clock" or "fullmove number").
        field: &'static str,
        found: String,
    },
    /// Strict mode: a move counter has leading zeros.
    #[error("{field} \"{found}\" has leading zeros")]
    LeadingZeros {
        field: &'static str,
        found: String,
    },
}

/// A SAN string that could not be interpreted against a position.
///
/// Carries the position (rendered as FEN), the offending notation, and the
/// reason code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot interpret \"{notation}\" in position \"{position}\": {reason}")]
pub struct NotationError {
    /// The position the notation was applied to, rendered as FEN.
    pub position: String,
    /// The offending notation text.
    pub notation: String,
    /// What went wrong.
    pub reason: NotationReason,
}

/// Reason codes for [`NotationError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationReason {
    /// The position itself is not legal; no notation can be interpreted.
    #[error("the position is not legal")]
    IllegalPosition,
    /// The text does not match the SAN grammar.
    #[error("the text is not a move notation")]
    InvalidSyntax,
    /// No piece of the named kind can reach the destination.
    #[error("no {piece} can move to {to}")]
    NoPieceCanMove { piece: PieceKind, to: Square },
    /// Several pieces of the named kind can reach the destination.
    #[error("more than one {piece} can move to {to}, disambiguation required")]
    RequiresDisambiguation { piece: PieceKind, to: Square },
    /// The only candidate move would leave the own king attacked.
    #[error("the move is not safe for the king")]
    NotSafeForKing,
    /// Castling toward that side is not legal in this position.
    #[error("castling is not legal here")]
    IllegalCastling { side: CastleSide },
    /// A pawn reaches the last rank without naming a promotion piece.
    #[error("the move requires a promotion piece")]
    MissingPromotion,
    /// A promotion piece is attached to a move that does not promote.
    #[error("the move cannot carry a promotion piece")]
    IllegalPromotion,
    /// Strict mode: the move captures but has no 'x'.
    #[error("the capture symbol is missing")]
    MissingCaptureSymbol,
    /// Strict mode: the move does not capture but has an 'x'.
    #[error("the capture symbol does not apply")]
    UnexpectedCaptureSymbol,
    /// Strict mode: the promotion piece is not introduced by '='.
    #[error("the promotion symbol '=' is missing")]
    MissingPromotionSymbol,
    /// Strict mode: the disambiguation is not the minimal one.
    #[error("wrong disambiguation, expected \"{expected}\"")]
    WrongDisambiguation { expected: String },
    /// Strict mode: the trailing check/checkmate marker is wrong.
    #[error("wrong check symbol, expected \"{expected}\"")]
    WrongCheckSymbol { expected: String },
}

/// A promotion factory was given a kind a pawn cannot promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} is not a valid promotion piece")]
pub struct InvalidPromotion {
    pub kind: PieceKind,
}
