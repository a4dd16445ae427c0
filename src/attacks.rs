//! Attack primitives and displacement lookup tables.
//!
//! The displacement between two squares uniquely identifies a direction in
//! the 0x88 encoding, so `to - from + 119` indexes two precomputed tables:
//! which colored pieces can move by that displacement, and the unit step
//! for walking the squares in between.

use once_cell::sync::Lazy;

use crate::color::Color;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::square::Square;

/// The board storage shared with [`Position`](crate::position::Position):
/// 128 cells, of which only the 64 with `index & 0x88 == 0` are playable.
pub(crate) type Cells = [Option<Piece>; 128];

pub(crate) const ROOK_DIRECTIONS: [i16; 4] = [-16, -1, 1, 16];
pub(crate) const BISHOP_DIRECTIONS: [i16; 4] = [-17, -15, 15, 17];
pub(crate) const KING_DIRECTIONS: [i16; 8] = [-17, -16, -15, -1, 1, 15, 16, 17];
pub(crate) const KNIGHT_DIRECTIONS: [i16; 8] = [-33, -31, -18, -14, 14, 18, 31, 33];
const WHITE_PAWN_ATTACKS: [i16; 2] = [15, 17];
const BLACK_PAWN_ATTACKS: [i16; 2] = [-15, -17];

/// The offsets at which the given colored piece attacks. Pawn entries are
/// color-dependent; all other sets are symmetric.
pub(crate) fn attack_directions(piece: Piece) -> &'static [i16] {
    match piece.kind() {
        PieceKind::King | PieceKind::Queen => &KING_DIRECTIONS,
        PieceKind::Rook => &ROOK_DIRECTIONS,
        PieceKind::Bishop => &BISHOP_DIRECTIONS,
        PieceKind::Knight => &KNIGHT_DIRECTIONS,
        PieceKind::Pawn => match piece.color() {
            Color::White => &WHITE_PAWN_ATTACKS,
            Color::Black => &BLACK_PAWN_ATTACKS,
        },
    }
}

struct Tables {
    /// Bit `p` of `movements[to - from + 119]` is set iff colored piece `p`
    /// can in principle displace from `from` to `to` on an empty board.
    /// Pawn single pushes and captures are included; double pushes and
    /// castling are special-cased by the adjudicator.
    movements: [u16; 239],
    /// The unit step along `to - from + 119` when the displacement lies on
    /// a queen line, 0 otherwise.
    directions: [i16; 239],
}

static TABLES: Lazy<Tables> = Lazy::new(build_tables);

fn build_tables() -> Tables {
    let mut movements = [0u16; 239];
    let mut directions = [0i16; 239];

    for from in Square::all() {
        for to in Square::all() {
            if from == to {
                continue;
            }
            let index = displacement_index(from, to);
            let df = to.file().index() as i16 - from.file().index() as i16;
            let dr = to.rank().index() as i16 - from.rank().index() as i16;

            if df == 0 || dr == 0 || df.abs() == dr.abs() {
                directions[index] = dr.signum() * 16 + df.signum();
            }

            let mut mask = 0u16;
            let mut set = |piece: Piece| mask |= 1u16 << piece.index();
            if df.abs() <= 1 && dr.abs() <= 1 {
                set(Piece::WHITE_KING);
                set(Piece::BLACK_KING);
            }
            if (df.abs() == 1 && dr.abs() == 2) || (df.abs() == 2 && dr.abs() == 1) {
                set(Piece::WHITE_KNIGHT);
                set(Piece::BLACK_KNIGHT);
            }
            if df == 0 || dr == 0 {
                set(Piece::WHITE_ROOK);
                set(Piece::BLACK_ROOK);
                set(Piece::WHITE_QUEEN);
                set(Piece::BLACK_QUEEN);
            }
            if df.abs() == dr.abs() {
                set(Piece::WHITE_BISHOP);
                set(Piece::BLACK_BISHOP);
                set(Piece::WHITE_QUEEN);
                set(Piece::BLACK_QUEEN);
            }
            if dr == 1 && df.abs() <= 1 {
                set(Piece::WHITE_PAWN);
            }
            if dr == -1 && df.abs() <= 1 {
                set(Piece::BLACK_PAWN);
            }
            movements[index] |= mask;
        }
    }

    Tables {
        movements,
        directions,
    }
}

/// Map a (from, to) pair onto the 0..239 table range.
#[inline]
pub(crate) fn displacement_index(from: Square, to: Square) -> usize {
    (to.index() as i16 - from.index() as i16 + 119) as usize
}

/// Constant-time test: can `piece` in principle displace from `from` to `to`?
#[inline]
pub(crate) fn movement_allows(piece: Piece, from: Square, to: Square) -> bool {
    TABLES.movements[displacement_index(from, to)] & (1u16 << piece.index()) != 0
}

/// The unit step from `from` toward `to`, or 0 if they share no queen line.
#[inline]
pub(crate) fn sliding_step(from: Square, to: Square) -> i16 {
    TABLES.directions[displacement_index(from, to)]
}

/// Return `true` if any piece of `by` attacks `target`.
///
/// Works on any board contents; the position need not be legal.
pub(crate) fn is_attacked(cells: &Cells, target: Square, by: Color) -> bool {
    PieceKind::ALL
        .into_iter()
        .any(|kind| has_attacker(cells, target, Piece::new(kind, by)))
}

/// Return `true` if at least one `piece` attacks `target`.
fn has_attacker(cells: &Cells, target: Square, piece: Piece) -> bool {
    let slider = piece.kind().is_slider();
    for &direction in attack_directions(piece) {
        // Walk backwards from the target toward the candidate attacker.
        let mut next = target.offset(-direction);
        while let Some(sq) = next {
            match cells[sq.index()] {
                Some(found) => {
                    if found == piece {
                        return true;
                    }
                    break;
                }
                None if slider => next = sq.offset(-direction),
                None => break,
            }
        }
    }
    false
}

/// Collect the squares of every `piece` attacking `target`, in direction
/// order. Works on any board contents; the position need not be legal.
pub(crate) fn attackers_of(cells: &Cells, target: Square, piece: Piece) -> Vec<Square> {
    let slider = piece.kind().is_slider();
    let mut attackers = Vec::new();
    for &direction in attack_directions(piece) {
        let mut next = target.offset(-direction);
        while let Some(sq) = next {
            match cells[sq.index()] {
                Some(found) => {
                    if found == piece {
                        attackers.push(sq);
                    }
                    break;
                }
                None if slider => next = sq.offset(-direction),
                None => break,
            }
        }
    }
    attackers
}
