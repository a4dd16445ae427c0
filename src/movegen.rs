//! Move-legality adjudication, exhaustive generation, and move application.
//!
//! The adjudicator is the single code path deciding legality of a
//! (from, to) pair; the generator and the notation parser both go through
//! it, so a generated descriptor and an adjudicated one always agree.

use crate::attacks::{self, attack_directions, KING_DIRECTIONS, KNIGHT_DIRECTIONS};
use crate::castle_rights::CastleSide;
use crate::chess_move::{Move, MoveKind};
use crate::color::Color;
use crate::error::InvalidPromotion;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::position::{Legality, Position};
use crate::square::{File, Square};

/// The promotion variants in generation order.
pub(crate) const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Outcome of adjudicating a proposed (from, to) pair.
///
/// A pawn reaching the last rank cannot commit to a promoted kind without
/// caller input, so that case carries a factory instead of a descriptor.
#[derive(Debug, Clone, Copy)]
pub enum MoveLegality {
    /// The move is not legal.
    Illegal,
    /// The move is legal and fully resolved.
    Regular(Move),
    /// The move is legal and promotes; call
    /// [`PromotionMove::promote`] to choose the piece.
    Promotion(PromotionMove),
}

impl MoveLegality {
    /// Return `true` unless the move was rejected.
    pub fn is_legal(&self) -> bool {
        !matches!(self, MoveLegality::Illegal)
    }

    /// Return the resolved descriptor of a non-promoting legal move.
    pub fn regular(self) -> Option<Move> {
        match self {
            MoveLegality::Regular(mv) => Some(mv),
            _ => None,
        }
    }
}

/// A legal pawn move onto the last rank, waiting for its promotion piece.
#[derive(Debug, Clone, Copy)]
pub struct PromotionMove {
    from: Square,
    to: Square,
    pawn: Piece,
    captured: Option<Piece>,
}

impl PromotionMove {
    /// The source square.
    pub fn from(&self) -> Square {
        self.from
    }

    /// The destination square on the last rank.
    pub fn to(&self) -> Square {
        self.to
    }

    /// Resolve the promotion into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPromotion`] if `kind` is a king or a pawn.
    pub fn promote(&self, kind: PieceKind) -> Result<Move, InvalidPromotion> {
        if !kind.is_promotable() {
            return Err(InvalidPromotion { kind });
        }
        Ok(Move::new(
            self.from,
            self.to,
            self.pawn,
            MoveKind::Promotion {
                promoted: kind,
                captured: self.captured,
            },
        ))
    }
}

impl Position {
    /// Decide whether moving the piece on `from` to `to` is legal, and
    /// build the descriptor if it is.
    ///
    /// Castling is proposed as the king moving two files; en passant as the
    /// pawn's diagonal onto the vacated square.
    pub fn is_move_legal(&mut self, from: Square, to: Square) -> MoveLegality {
        if !self.is_legal() {
            return MoveLegality::Illegal;
        }
        let turn = self.turn;
        let piece = match self.board[from.index()] {
            Some(p) if p.color() == turn => p,
            _ => return MoveLegality::Illegal,
        };

        // Geometric admissibility, with the two pawn and king special cases
        // the displacement table deliberately leaves out.
        let mut double_push = false;
        if !attacks::movement_allows(piece, from, to) {
            let displacement = to.index() as i16 - from.index() as i16;
            if piece.kind() == PieceKind::Pawn
                && displacement == 2 * turn.pawn_step()
                && from.rank() == turn.pawn_home_rank()
            {
                double_push = true;
            } else if piece.kind() == PieceKind::King && displacement.abs() == 2 {
                return match self.castling_move(from, to) {
                    Some(mv) => MoveLegality::Regular(mv),
                    None => MoveLegality::Illegal,
                };
            } else {
                return MoveLegality::Illegal;
            }
        }

        // Destination content.
        let mut captured: Option<Piece> = None;
        let mut en_passant_capture: Option<Square> = None;
        let destination = self.board[to.index()];
        if piece.kind() == PieceKind::Pawn {
            if to.file() == from.file() {
                if destination.is_some() {
                    return MoveLegality::Illegal;
                }
            } else {
                match destination {
                    Some(victim) if victim.color() != turn => captured = Some(victim),
                    Some(_) => return MoveLegality::Illegal,
                    None => {
                        // A diagonal onto an empty square is only the en
                        // passant capture.
                        if self.en_passant != Some(to.file())
                            || to.rank() != turn.en_passant_rank()
                        {
                            return MoveLegality::Illegal;
                        }
                        let capture_sq = Square::new(from.rank(), to.file());
                        match self.board[capture_sq.index()] {
                            Some(victim) if victim.color() != turn => {
                                captured = Some(victim);
                                en_passant_capture = Some(capture_sq);
                            }
                            _ => return MoveLegality::Illegal,
                        }
                    }
                }
            }
        } else {
            match destination {
                Some(victim) if victim.color() != turn => captured = Some(victim),
                Some(_) => return MoveLegality::Illegal,
                None => {}
            }
        }

        // Path emptiness for sliders and double pushes.
        if double_push {
            let skipped = match from.offset(turn.pawn_step()) {
                Some(sq) => sq,
                None => return MoveLegality::Illegal,
            };
            if self.board[skipped.index()].is_some() {
                return MoveLegality::Illegal;
            }
        } else if piece.is_slider() {
            let step = attacks::sliding_step(from, to);
            let mut sq = from;
            loop {
                sq = match sq.offset(step) {
                    Some(next) => next,
                    None => return MoveLegality::Illegal,
                };
                if sq == to {
                    break;
                }
                if self.board[sq.index()].is_some() {
                    return MoveLegality::Illegal;
                }
            }
        }

        // Reversible king-safety probe.
        if !self.king_safe_after(from, to, en_passant_capture) {
            return MoveLegality::Illegal;
        }

        if piece.kind() == PieceKind::Pawn && to.rank() == turn.promotion_rank() {
            return MoveLegality::Promotion(PromotionMove {
                from,
                to,
                pawn: piece,
                captured,
            });
        }
        let kind = if let Some(capture_sq) = en_passant_capture {
            MoveKind::EnPassant {
                captured: capture_sq,
            }
        } else if double_push {
            MoveKind::DoublePawnPush
        } else if let Some(victim) = captured {
            MoveKind::Capture { victim }
        } else {
            MoveKind::Normal
        };
        MoveLegality::Regular(Move::new(from, to, piece, kind))
    }

    /// Adjudicate a castling proposal (king moving two files along its back
    /// rank). Requires the matching castling right, an empty corridor
    /// between king and rook, and an unattacked origin, pass-through, and
    /// destination square.
    pub(crate) fn castling_move(&mut self, from: Square, to: Square) -> Option<Move> {
        let color = self.turn;
        let back = color.back_rank();
        if from.rank() != back || to.rank() != back {
            return None;
        }
        let side = if to.file() > from.file() {
            CastleSide::KingSide
        } else {
            CastleSide::QueenSide
        };
        if !self.castling.has(color, side) {
            return None;
        }
        let king = Piece::new(PieceKind::King, color);
        if self.board[from.index()] != Some(king) {
            return None;
        }
        let rook_from = Square::new(back, side.rook_file());
        if self.board[rook_from.index()] != Some(Piece::new(PieceKind::Rook, color)) {
            return None;
        }

        let step: i16 = if rook_from.file() > from.file() { 1 } else { -1 };
        let mut sq = from.offset(step)?;
        while sq != rook_from {
            if self.board[sq.index()].is_some() {
                return None;
            }
            sq = sq.offset(step)?;
        }

        // The pass-through square doubles as the rook destination.
        let rook_to = Square::from_index(((from.index() + to.index()) / 2) as u8)?;
        let opponent = color.opponent();
        for checked in [from, rook_to, to] {
            if attacks::is_attacked(&self.board, checked, opponent) {
                return None;
            }
        }

        Some(Move::new(
            from,
            to,
            king,
            MoveKind::Castling { rook_from, rook_to },
        ))
    }

    /// Tentatively apply the board diff of a move, ask whether the mover's
    /// king would be attacked, and revert. The revert is straight-line code
    /// so the board is whole again on every path.
    pub(crate) fn king_safe_after(
        &mut self,
        from: Square,
        to: Square,
        en_passant_capture: Option<Square>,
    ) -> bool {
        let moving = self.board[from.index()];
        let target = self.board[to.index()];
        let mut removed = None;

        self.board[to.index()] = moving;
        self.board[from.index()] = None;
        if let Some(sq) = en_passant_capture {
            removed = self.board[sq.index()];
            self.board[sq.index()] = None;
        }

        let king_sq = match moving {
            Some(p) if p.kind() == PieceKind::King => Some(to),
            _ => self.kings[self.turn.index()],
        };
        let safe = match king_sq {
            Some(sq) => !attacks::is_attacked(&self.board, sq, self.turn.opponent()),
            None => true,
        };

        if let Some(sq) = en_passant_capture {
            self.board[sq.index()] = removed;
        }
        self.board[from.index()] = moving;
        self.board[to.index()] = target;
        safe
    }

    /// Generate every legal move, in ascending source-square order with
    /// per-piece direction order; promotions expand into their four
    /// variants. An illegal position yields nothing.
    pub fn moves(&mut self) -> Vec<Move> {
        self.generate(false)
    }

    /// Return `true` if at least one legal move exists, stopping at the
    /// first one found.
    pub fn has_move(&mut self) -> bool {
        !self.generate(true).is_empty()
    }

    fn generate(&mut self, first_only: bool) -> Vec<Move> {
        let mut out = Vec::new();
        if !self.is_legal() {
            return out;
        }
        let turn = self.turn;
        for from in Square::all() {
            let Some(piece) = self.board[from.index()] else {
                continue;
            };
            if piece.color() != turn {
                continue;
            }
            match piece.kind() {
                PieceKind::Pawn => {
                    let step = turn.pawn_step();
                    for delta in [step - 1, step + 1, step, 2 * step] {
                        if let Some(to) = from.offset(delta) {
                            self.adjudicate_into(from, to, &mut out);
                            if first_only && !out.is_empty() {
                                return out;
                            }
                        }
                    }
                }
                PieceKind::Knight | PieceKind::King => {
                    let directions: &[i16] = if piece.kind() == PieceKind::Knight {
                        &KNIGHT_DIRECTIONS
                    } else {
                        &KING_DIRECTIONS
                    };
                    for &delta in directions {
                        if let Some(to) = from.offset(delta) {
                            self.adjudicate_into(from, to, &mut out);
                            if first_only && !out.is_empty() {
                                return out;
                            }
                        }
                    }
                    if piece.kind() == PieceKind::King
                        && self.castling.file_mask(turn) != 0
                    {
                        for delta in [2i16, -2] {
                            if let Some(to) = from.offset(delta) {
                                self.adjudicate_into(from, to, &mut out);
                                if first_only && !out.is_empty() {
                                    return out;
                                }
                            }
                        }
                    }
                }
                _ => {
                    for &delta in attack_directions(piece) {
                        let mut next = from.offset(delta);
                        while let Some(to) = next {
                            let occupied = self.board[to.index()].is_some();
                            self.adjudicate_into(from, to, &mut out);
                            if first_only && !out.is_empty() {
                                return out;
                            }
                            if occupied {
                                break;
                            }
                            next = to.offset(delta);
                        }
                    }
                }
            }
        }
        out
    }

    fn adjudicate_into(&mut self, from: Square, to: Square, out: &mut Vec<Move>) {
        match self.is_move_legal(from, to) {
            MoveLegality::Illegal => {}
            MoveLegality::Regular(mv) => out.push(mv),
            MoveLegality::Promotion(promotion) => {
                for kind in PROMOTION_KINDS {
                    if let Ok(mv) = promotion.promote(kind) {
                        out.push(mv);
                    }
                }
            }
        }
    }

    /// Return `true` if the position is legal and the side to move is in
    /// check.
    pub fn is_check(&mut self) -> bool {
        if !self.is_legal() {
            return false;
        }
        let Some(king_sq) = self.kings[self.turn.index()] else {
            return false;
        };
        attacks::is_attacked(&self.board, king_sq, self.turn.opponent())
    }

    /// Checkmate: legal, in check, and without a legal move.
    pub fn is_checkmate(&mut self) -> bool {
        self.is_check() && !self.has_move()
    }

    /// Stalemate: legal, not in check, and without a legal move.
    pub fn is_stalemate(&mut self) -> bool {
        self.is_legal() && !self.is_check() && !self.has_move()
    }

    /// A null move is legal iff the position is legal and the side to move
    /// is not in check.
    pub fn is_null_move_legal(&mut self) -> bool {
        self.is_legal() && !self.is_check()
    }

    /// Pass the turn without moving: toggles the side to move and clears
    /// the en passant file. Returns `false` without touching the position
    /// if the null move is not legal.
    pub fn play_null_move(&mut self) -> bool {
        if !self.is_null_move_legal() {
            return false;
        }
        self.turn = self.turn.opponent();
        self.en_passant = None;
        self.legality = Legality::Legal;
        true
    }

    /// Apply a descriptor produced by this position's generator or
    /// adjudicator.
    ///
    /// The descriptor is trusted: applying one that came from a different
    /// position is unspecified. The position stays legal afterwards, so the
    /// legality cache is preserved rather than invalidated.
    pub fn play(&mut self, mv: Move) {
        let turn = self.turn;
        self.board[mv.from().index()] = None;
        self.board[mv.to().index()] = Some(mv.final_piece());
        match mv.kind() {
            MoveKind::EnPassant { captured } => {
                self.board[captured.index()] = None;
            }
            MoveKind::Castling { rook_from, rook_to } => {
                self.board[rook_from.index()] = None;
                self.board[rook_to.index()] = Some(Piece::new(PieceKind::Rook, turn));
            }
            _ => {}
        }

        // A king move drops both of its color's rights; any move touching a
        // rook home square that still carries a bit drops that bit.
        if mv.piece().kind() == PieceKind::King {
            self.castling = self.castling.revoke_color(turn);
        }
        for color in Color::ALL {
            if self.castling.file_mask(color) == 0 {
                continue;
            }
            let back = color.back_rank();
            for file in File::all() {
                if !self.castling.has_file(color, file) {
                    continue;
                }
                let home = Square::new(back, file);
                if mv.from() == home || mv.to() == home {
                    self.castling = self.castling.revoke(color, file);
                }
            }
        }

        // Record the en passant file only when an enemy pawn is actually in
        // position to capture.
        self.en_passant = if mv.is_double_pawn_push() {
            let enemy_pawn = Piece::new(PieceKind::Pawn, turn.opponent());
            let adjacent = [-1i16, 1].into_iter().any(|delta| {
                mv.to()
                    .offset(delta)
                    .is_some_and(|sq| self.board[sq.index()] == Some(enemy_pawn))
            });
            if adjacent { Some(mv.to().file()) } else { None }
        } else {
            None
        };

        if mv.piece().kind() == PieceKind::King {
            self.kings[turn.index()] = Some(mv.to());
        }
        self.turn = turn.opponent();
        self.legality = Legality::Legal;
    }
}
