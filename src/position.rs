//! The position aggregate: board, side to move, castling rights,
//! en passant file, and the lazily maintained legality and king caches.

use std::fmt;

use crate::attacks::{self, Cells};
use crate::castle_rights::CastlingRights;
use crate::color::Color;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::square::{File, Rank, Square};

/// The tri-state legality cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Legality {
    Unknown,
    Legal,
    Illegal,
}

/// A chess position.
///
/// A `Position` owns its board storage; cloning produces an independent
/// value. Every setter resets the legality and king caches, and the
/// operations that run the reversible king-safety probe take `&mut self`,
/// so the transient probe states are never observable.
#[derive(Clone, Copy)]
pub struct Position {
    pub(crate) board: Cells,
    pub(crate) turn: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<File>,
    /// King squares per color; meaningful only while `legality` is resolved.
    pub(crate) kings: [Option<Square>; 2],
    pub(crate) legality: Legality,
}

impl Position {
    /// An empty board, White to move, no castling rights, no en passant.
    pub fn empty() -> Position {
        Position {
            board: [None; 128],
            turn: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            kings: [None; 2],
            legality: Legality::Unknown,
        }
    }

    /// The standard starting position.
    pub fn starting_position() -> Position {
        let mut position = Position::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in File::all().zip(back) {
            position.board[Square::new(Rank::R1, file).index()] =
                Some(Piece::new(kind, Color::White));
            position.board[Square::new(Rank::R2, file).index()] = Some(Piece::WHITE_PAWN);
            position.board[Square::new(Rank::R7, file).index()] = Some(Piece::BLACK_PAWN);
            position.board[Square::new(Rank::R8, file).index()] =
                Some(Piece::new(kind, Color::Black));
        }
        position.castling = CastlingRights::ALL;
        position
    }

    /// The piece on a square, if any.
    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    /// Put a piece on a square (or clear it with `None`).
    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.board[sq.index()] = piece;
        self.invalidate();
    }

    /// The side to move.
    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Set the side to move.
    pub fn set_turn(&mut self, turn: Color) {
        self.turn = turn;
        self.invalidate();
    }

    /// The current castling rights.
    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    /// Set the castling rights.
    pub fn set_castling(&mut self, castling: CastlingRights) {
        self.castling = castling;
        self.invalidate();
    }

    /// The file of a capturable double pawn push, if any.
    #[inline]
    pub fn en_passant_file(&self) -> Option<File> {
        self.en_passant
    }

    /// Set the en passant file.
    pub fn set_en_passant(&mut self, file: Option<File>) {
        self.en_passant = file;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.legality = Legality::Unknown;
    }

    /// Return `true` if any piece of `by` attacks `sq`.
    ///
    /// Pure board query; the position need not be legal.
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        attacks::is_attacked(&self.board, sq, by)
    }

    /// Collect the squares of every `piece` attacking `sq`.
    ///
    /// Pure board query; the position need not be legal.
    pub fn attackers_of(&self, sq: Square, piece: Piece) -> Vec<Square> {
        attacks::attackers_of(&self.board, sq, piece)
    }

    /// The square of the given color's king, or `None` unless the board
    /// holds exactly one king of that color.
    pub fn king_square(&mut self, color: Color) -> Option<Square> {
        self.refresh_legality();
        self.kings[color.index()]
    }

    /// Return `true` if the position is structurally legal: one king per
    /// color, no pawn on the first or last rank, the side not to move not
    /// in check, castling bits backed by their king and rook, and a
    /// consistent en passant square. The result is cached until a setter
    /// runs.
    pub fn is_legal(&mut self) -> bool {
        self.refresh_legality();
        self.legality == Legality::Legal
    }

    pub(crate) fn refresh_legality(&mut self) {
        if self.legality != Legality::Unknown {
            return;
        }
        self.legality = if self.compute_legality() {
            Legality::Legal
        } else {
            Legality::Illegal
        };
    }

    fn compute_legality(&mut self) -> bool {
        let mut counts = [0u32; 2];
        let mut kings = [None; 2];
        let mut pawn_on_edge = false;
        for sq in Square::all() {
            let Some(piece) = self.board[sq.index()] else {
                continue;
            };
            match piece.kind() {
                PieceKind::King => {
                    counts[piece.color().index()] += 1;
                    kings[piece.color().index()] = Some(sq);
                }
                PieceKind::Pawn => {
                    if sq.rank() == Rank::R1 || sq.rank() == Rank::R8 {
                        pawn_on_edge = true;
                    }
                }
                _ => {}
            }
        }
        self.kings = [
            if counts[0] == 1 { kings[0] } else { None },
            if counts[1] == 1 { kings[1] } else { None },
        ];
        if counts != [1, 1] || pawn_on_edge {
            return false;
        }

        // The side that is not to move must not be in check.
        let opponent = self.turn.opponent();
        let Some(opponent_king) = self.kings[opponent.index()] else {
            return false;
        };
        if attacks::is_attacked(&self.board, opponent_king, self.turn) {
            return false;
        }

        // Every castling bit needs its king and rook on their home squares.
        for color in Color::ALL {
            if self.castling.file_mask(color) == 0 {
                continue;
            }
            let back = color.back_rank();
            let king_home = Square::new(back, File::E);
            if self.board[king_home.index()] != Some(Piece::new(PieceKind::King, color)) {
                return false;
            }
            for file in File::all() {
                if self.castling.has_file(color, file)
                    && self.board[Square::new(back, file).index()]
                        != Some(Piece::new(PieceKind::Rook, color))
                {
                    return false;
                }
            }
        }

        // An en passant file needs the double-pushed pawn in place and the
        // two squares it crossed empty.
        if let Some(file) = self.en_passant {
            let (origin_rank, pawn_rank) = match self.turn {
                Color::White => (Rank::R7, Rank::R5),
                Color::Black => (Rank::R2, Rank::R4),
            };
            let target = Square::new(self.turn.en_passant_rank(), file);
            let pawn_sq = Square::new(pawn_rank, file);
            let origin = Square::new(origin_rank, file);
            let pushed_pawn = Piece::new(PieceKind::Pawn, opponent);
            if self.board[target.index()].is_some()
                || self.board[pawn_sq.index()] != Some(pushed_pawn)
                || self.board[origin.index()].is_some()
            {
                return false;
            }
        }

        true
    }

    /// Return a pretty-printable wrapper for this position.
    pub fn pretty(&self) -> PrettyPosition<'_> {
        PrettyPosition(self)
    }
}

/// Structure equality: board, turn, castling, en passant. Caches are
/// derived state and do not participate.
impl PartialEq for Position {
    fn eq(&self, other: &Position) -> bool {
        self.board == other.board
            && self.turn == other.turn
            && self.castling == other.castling
            && self.en_passant == other.en_passant
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self)
    }
}

/// Wrapper for pretty-printing a position as an 8x8 grid.
pub struct PrettyPosition<'a>(&'a Position);

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::all().rev() {
            write!(f, "{}  ", rank)?;
            for file in File::all() {
                let sq = Square::new(rank, file);
                let c = match self.0.piece_on(sq) {
                    Some(piece) => piece.fen_char(),
                    None => '.',
                };
                if file == File::H {
                    write!(f, "{c}")?;
                } else {
                    write!(f, "{c} ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::Position;
    use crate::castle_rights::CastlingRights;
    use crate::color::Color;
    use crate::piece::Piece;
    use crate::square::{File, Square};

    #[test]
    fn starting_position_layout() {
        let position = Position::starting_position();
        assert_eq!(position.piece_on(Square::E1), Some(Piece::WHITE_KING));
        assert_eq!(position.piece_on(Square::D8), Some(Piece::BLACK_QUEEN));
        assert_eq!(position.piece_on(Square::A1), Some(Piece::WHITE_ROOK));
        assert_eq!(position.piece_on(Square::G8), Some(Piece::BLACK_KNIGHT));
        assert_eq!(position.piece_on(Square::C2), Some(Piece::WHITE_PAWN));
        assert_eq!(position.piece_on(Square::E4), None);
        assert_eq!(position.turn(), Color::White);
        assert_eq!(position.castling(), CastlingRights::ALL);
        assert_eq!(position.en_passant_file(), None);
    }

    #[test]
    fn starting_position_is_legal() {
        let mut position = Position::starting_position();
        assert!(position.is_legal());
        assert_eq!(position.king_square(Color::White), Some(Square::E1));
        assert_eq!(position.king_square(Color::Black), Some(Square::E8));
    }

    #[test]
    fn empty_position_is_illegal() {
        let mut position = Position::empty();
        assert!(!position.is_legal());
        assert_eq!(position.king_square(Color::White), None);
    }

    #[test]
    fn two_kings_of_one_color_is_illegal() {
        let mut position = Position::starting_position();
        position.set_piece(Square::E4, Some(Piece::WHITE_KING));
        assert!(!position.is_legal());
        assert_eq!(position.king_square(Color::White), None);
    }

    #[test]
    fn pawn_on_back_rank_is_illegal() {
        let mut position = Position::starting_position();
        position.set_piece(Square::A3, Some(Piece::WHITE_PAWN));
        assert!(position.is_legal());
        position.set_piece(Square::A3, None);
        position.set_piece(Square::H8, Some(Piece::WHITE_PAWN));
        assert!(!position.is_legal());
    }

    #[test]
    fn side_not_to_move_in_check_is_illegal() {
        // White to move while the black king is already attacked.
        let mut position = Position::empty();
        position.set_piece(Square::E1, Some(Piece::WHITE_KING));
        position.set_piece(Square::E8, Some(Piece::BLACK_KING));
        position.set_piece(Square::E4, Some(Piece::WHITE_ROOK));
        assert!(!position.is_legal());
        position.set_turn(Color::Black);
        assert!(position.is_legal());
    }

    #[test]
    fn castling_bit_without_rook_is_illegal() {
        let mut position = Position::starting_position();
        position.set_piece(Square::H1, None);
        assert!(!position.is_legal());
        position.set_castling(CastlingRights::ALL.revoke(Color::White, File::H));
        assert!(position.is_legal());
    }

    #[test]
    fn setters_invalidate_the_cache() {
        let mut position = Position::starting_position();
        assert!(position.is_legal());
        position.set_piece(Square::E1, None);
        assert!(!position.is_legal());
        position.set_piece(Square::E1, Some(Piece::WHITE_KING));
        assert!(position.is_legal());
    }

    #[test]
    fn equality_ignores_caches() {
        let mut a = Position::starting_position();
        let b = Position::starting_position();
        assert!(a.is_legal());
        assert_eq!(a, b);
        a.set_turn(Color::Black);
        assert_ne!(a, b);
    }

    #[test]
    fn attack_queries_on_illegal_positions() {
        // A lone king: no black king, so the position is illegal, but the
        // attack primitives still answer.
        let mut position = Position::empty();
        position.set_piece(Square::E5, Some(Piece::WHITE_KING));
        assert!(!position.is_legal());
        let footprint = [
            Square::D4,
            Square::E4,
            Square::F4,
            Square::D5,
            Square::F5,
            Square::D6,
            Square::E6,
            Square::F6,
        ];
        for target in footprint {
            assert!(position.is_attacked(target, Color::White));
            assert_eq!(
                position.attackers_of(target, Piece::WHITE_KING),
                vec![Square::E5]
            );
        }
    }

    #[test]
    fn pretty_print() {
        let position = Position::starting_position();
        let output = format!("{}", position.pretty());
        assert!(output.contains("r n b q k b n r"));
        assert!(output.contains("R N B Q K B N R"));
        assert!(output.contains("a b c d e f g h"));
    }
}
