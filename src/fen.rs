//! FEN parsing and rendering.
//!
//! The move counters belong to the FEN text, not to the position model, so
//! parsing returns them alongside the position in [`FenData`] and rendering
//! takes them as arguments. `FromStr`/`Display` on [`Position`] are the
//! tolerant parse and the render with counters 0 and 1.

use std::fmt;
use std::str::FromStr;

use crate::castle_rights::CastlingRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::Piece;
use crate::position::Position;
use crate::square::{File, Rank, Square};

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A parsed FEN record: the position plus the two move counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenData {
    pub position: Position,
    /// Half-moves since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// Full-move number, starting at 1.
    pub fullmove_number: u32,
}

/// Parse a FEN string, tolerating castling letters in any order, an en
/// passant rank on either side, and leading-zero counters.
pub fn parse_fen(fen: &str) -> Result<FenData, FenError> {
    parse(fen, false)
}

/// Parse a FEN string, requiring canonical castling order, no leading
/// zeros, a positive full-move number, and an en passant rank consistent
/// with the side to move.
pub fn parse_fen_strict(fen: &str) -> Result<FenData, FenError> {
    parse(fen, true)
}

fn parse(fen: &str, strict: bool) -> Result<FenData, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::WrongFieldCount {
            found: fields.len(),
        });
    }

    // Field 1: piece placement, ranks 8 down to 1.
    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }
    let mut position = Position::empty();
    for (rank_index, rank_str) in ranks.iter().enumerate() {
        let rank = Rank::from_index(7 - rank_index as u8).unwrap();
        let mut width: u32 = 0;
        for c in rank_str.chars() {
            if let Some(digit) = c.to_digit(10) {
                if !(1..=8).contains(&digit) {
                    return Err(FenError::InvalidPieceChar { character: c });
                }
                width += digit;
            } else {
                let piece =
                    Piece::from_fen_char(c).ok_or(FenError::InvalidPieceChar { character: c })?;
                if width >= 8 {
                    return Err(FenError::BadRankLength {
                        rank_index,
                        width: width as usize + 1,
                    });
                }
                let file = File::from_index(width as u8).unwrap();
                position.set_piece(Square::new(rank, file), Some(piece));
                width += 1;
            }
        }
        if width != 8 {
            return Err(FenError::BadRankLength {
                rank_index,
                width: width as usize,
            });
        }
    }

    // Field 2: active color.
    let turn = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(FenError::InvalidTurn {
                found: other.to_string(),
            });
        }
    };
    position.set_turn(turn);

    // Field 3: castling rights.
    let castling = if strict {
        CastlingRights::from_fen_strict(fields[2])?
    } else {
        CastlingRights::from_fen(fields[2])?
    };
    position.set_castling(castling);

    // Field 4: en passant target square.
    if fields[3] != "-" {
        let mut chars = fields[3].chars();
        let file = chars.next().and_then(File::from_char);
        let rank = chars.next();
        let trailing = chars.next();
        let (file, rank) = match (file, rank, trailing) {
            (Some(file), Some(rank @ ('3' | '6')), None) => (file, rank),
            _ => {
                return Err(FenError::InvalidEnPassant {
                    found: fields[3].to_string(),
                });
            }
        };
        let expected = match turn {
            Color::White => '6',
            Color::Black => '3',
        };
        if strict && rank != expected {
            return Err(FenError::EnPassantRankMismatch {
                found: fields[3].to_string(),
            });
        }
        position.set_en_passant(Some(file));
    }

    // Fields 5 and 6: move counters.
    let halfmove_clock = parse_counter(fields[4], "halfmove clock", strict)?;
    let fullmove_number = parse_counter(fields[5], "fullmove number", strict)?;
    if strict && fullmove_number == 0 {
        return Err(FenError::InvalidMoveCounter {
            field: "fullmove number",
            found: fields[5].to_string(),
        });
    }

    Ok(FenData {
        position,
        halfmove_clock,
        fullmove_number,
    })
}

fn parse_counter(s: &str, field: &'static str, strict: bool) -> Result<u32, FenError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FenError::InvalidMoveCounter {
            field,
            found: s.to_string(),
        });
    }
    if strict && s.len() > 1 && s.starts_with('0') {
        return Err(FenError::LeadingZeros {
            field,
            found: s.to_string(),
        });
    }
    s.parse().map_err(|_| FenError::InvalidMoveCounter {
        field,
        found: s.to_string(),
    })
}

/// Render a position as a FEN string with the given move counters.
pub fn render_fen(position: &Position, halfmove_clock: u32, fullmove_number: u32) -> String {
    let mut fen = String::with_capacity(80);
    for rank in Rank::all().rev() {
        let mut empty_run = 0u32;
        for file in File::all() {
            match position.piece_on(Square::new(rank, file)) {
                Some(piece) => {
                    if empty_run > 0 {
                        fen.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    fen.push(piece.fen_char());
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            fen.push_str(&empty_run.to_string());
        }
        if rank != Rank::R1 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push_str(&position.turn().to_string());
    fen.push(' ');
    fen.push_str(&position.castling().to_fen());
    fen.push(' ');
    match position.en_passant_file() {
        Some(file) => {
            fen.push(file.to_char());
            fen.push(match position.turn() {
                Color::White => '6',
                Color::Black => '3',
            });
        }
        None => fen.push('-'),
    }
    fen.push(' ');
    fen.push_str(&halfmove_clock.to_string());
    fen.push(' ');
    fen.push_str(&fullmove_number.to_string());
    fen
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Position, FenError> {
        parse_fen(fen).map(|data| data.position)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_fen(self, 0, 1))
    }
}
