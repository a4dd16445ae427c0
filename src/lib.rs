//! Chess position core: representation, structural legality, legal move
//! generation and adjudication, reversible application, and the FEN and
//! SAN codecs.
//!
//! The [`Position`] is the central aggregate. It is created empty, from
//! the starting array, by copy, or from FEN; mutated through setters or
//! [`Position::play`]; and queried through the legality, generation, and
//! notation operations. Everything is synchronous, deterministic, and
//! in-memory.

mod attacks;
mod castle_rights;
mod chess_move;
mod color;
mod error;
mod fen;
mod movegen;
mod notation;
mod perft;
mod piece;
mod piece_kind;
mod position;
mod square;

pub use castle_rights::{CastleSide, CastlingRights};
pub use chess_move::{Move, MoveKind};
pub use color::Color;
pub use error::{FenError, InvalidPromotion, NotationError, NotationReason};
pub use fen::{parse_fen, parse_fen_strict, render_fen, FenData, STARTING_FEN};
pub use movegen::{MoveLegality, PromotionMove};
pub use perft::{divide, perft};
pub use piece::Piece;
pub use piece_kind::PieceKind;
pub use position::{Position, PrettyPosition};
pub use square::{File, Rank, Square};
