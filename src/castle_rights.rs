//! Castling rights as file-indexed bitsets, one per color.

use std::fmt;

use crate::color::Color;
use crate::error::FenError;
use crate::square::File;

/// Which side of the board to castle toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    KingSide,
    QueenSide,
}

impl CastleSide {
    /// Both sides in king-side-first order.
    pub const ALL: [CastleSide; 2] = [CastleSide::KingSide, CastleSide::QueenSide];

    /// The file the castling rook starts on.
    #[inline]
    pub const fn rook_file(self) -> File {
        match self {
            CastleSide::KingSide => File::H,
            CastleSide::QueenSide => File::A,
        }
    }
}

/// Castling rights, one bitset per color indexed by rook file.
///
/// Bit `f` of `files[color]` means the right with the rook on file `f` is
/// preserved. Standard chess only ever uses bits 0 (queen side) and 7
/// (king side); the file indexing leaves room for Chess960 rook files.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    files: [u8; 2],
}

impl CastlingRights {
    /// No castling rights.
    pub const NONE: CastlingRights = CastlingRights { files: [0, 0] };

    /// All four standard rights.
    pub const ALL: CastlingRights = CastlingRights {
        files: [0b1000_0001, 0b1000_0001],
    };

    /// Return `true` if no right remains for either color.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.files[0] == 0 && self.files[1] == 0
    }

    /// Return the raw file bitset for one color.
    #[inline]
    pub(crate) const fn file_mask(self, color: Color) -> u8 {
        self.files[color.index()]
    }

    /// Check the right with the rook on the given file.
    #[inline]
    pub const fn has_file(self, color: Color, file: File) -> bool {
        self.files[color.index()] & (1u8 << file.index()) != 0
    }

    /// Check the right toward the given side (standard rook files).
    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.has_file(color, side.rook_file())
    }

    /// Return new rights with the given file bit set.
    #[inline]
    pub const fn grant(self, color: Color, file: File) -> CastlingRights {
        let mut files = self.files;
        files[color.index()] |= 1u8 << file.index();
        CastlingRights { files }
    }

    /// Return new rights with the given file bit cleared.
    #[inline]
    pub const fn revoke(self, color: Color, file: File) -> CastlingRights {
        let mut files = self.files;
        files[color.index()] &= !(1u8 << file.index());
        CastlingRights { files }
    }

    /// Return new rights with every bit of the given color cleared.
    #[inline]
    pub const fn revoke_color(self, color: Color) -> CastlingRights {
        let mut files = self.files;
        files[color.index()] = 0;
        CastlingRights { files }
    }

    /// Parse the FEN castling field, accepting the letters in any order.
    pub fn from_fen(s: &str) -> Result<CastlingRights, FenError> {
        if s == "-" {
            return Ok(CastlingRights::NONE);
        }
        let mut rights = CastlingRights::NONE;
        for c in s.chars() {
            let (color, side) = match c {
                'K' => (Color::White, CastleSide::KingSide),
                'Q' => (Color::White, CastleSide::QueenSide),
                'k' => (Color::Black, CastleSide::KingSide),
                'q' => (Color::Black, CastleSide::QueenSide),
                _ => return Err(FenError::InvalidCastlingChar { character: c }),
            };
            rights = rights.grant(color, side.rook_file());
        }
        Ok(rights)
    }

    /// Parse the FEN castling field, requiring the canonical `KQkq` order
    /// with no repeated letters.
    pub fn from_fen_strict(s: &str) -> Result<CastlingRights, FenError> {
        if s != "-" {
            let mut last = None;
            for c in s.chars() {
                let position = "KQkq".find(c).ok_or(FenError::InvalidCastlingChar {
                    character: c,
                })?;
                if last.is_some_and(|prev| position <= prev) {
                    return Err(FenError::NonCanonicalCastling {
                        found: s.to_string(),
                    });
                }
                last = Some(position);
            }
        }
        CastlingRights::from_fen(s)
    }

    /// Render the FEN castling field in canonical order.
    pub fn to_fen(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.has(Color::White, CastleSide::KingSide) {
            s.push('K');
        }
        if self.has(Color::White, CastleSide::QueenSide) {
            s.push('Q');
        }
        if self.has(Color::Black, CastleSide::KingSide) {
            s.push('k');
        }
        if self.has(Color::Black, CastleSide::QueenSide) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastlingRights({})", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::{CastleSide, CastlingRights};
    use crate::color::Color;
    use crate::error::FenError;
    use crate::square::File;

    #[test]
    fn grant_revoke() {
        let rights = CastlingRights::NONE
            .grant(Color::White, File::H)
            .grant(Color::Black, File::A);
        assert!(rights.has(Color::White, CastleSide::KingSide));
        assert!(!rights.has(Color::White, CastleSide::QueenSide));
        assert!(rights.has(Color::Black, CastleSide::QueenSide));

        let rights = rights.revoke(Color::White, File::H);
        assert!(!rights.has(Color::White, CastleSide::KingSide));
        assert!(rights.has(Color::Black, CastleSide::QueenSide));
    }

    #[test]
    fn revoke_color() {
        let rights = CastlingRights::ALL.revoke_color(Color::White);
        assert!(!rights.has(Color::White, CastleSide::KingSide));
        assert!(!rights.has(Color::White, CastleSide::QueenSide));
        assert!(rights.has(Color::Black, CastleSide::KingSide));
        assert!(rights.has(Color::Black, CastleSide::QueenSide));
    }

    #[test]
    fn from_fen_any_order() {
        let canonical = CastlingRights::from_fen("KQkq").unwrap();
        let shuffled = CastlingRights::from_fen("qkQK").unwrap();
        assert_eq!(canonical, shuffled);
        assert_eq!(shuffled.to_fen(), "KQkq");
    }

    #[test]
    fn from_fen_none_and_invalid() {
        assert_eq!(CastlingRights::from_fen("-").unwrap(), CastlingRights::NONE);
        assert!(matches!(
            CastlingRights::from_fen("KZ"),
            Err(FenError::InvalidCastlingChar { character: 'Z' })
        ));
    }

    #[test]
    fn strict_requires_canonical_order() {
        assert!(CastlingRights::from_fen_strict("KQkq").is_ok());
        assert!(CastlingRights::from_fen_strict("Kq").is_ok());
        assert!(CastlingRights::from_fen_strict("-").is_ok());
        assert!(matches!(
            CastlingRights::from_fen_strict("qK"),
            Err(FenError::NonCanonicalCastling { .. })
        ));
        assert!(matches!(
            CastlingRights::from_fen_strict("KK"),
            Err(FenError::NonCanonicalCastling { .. })
        ));
    }

    #[test]
    fn render_canonical() {
        assert_eq!(CastlingRights::ALL.to_fen(), "KQkq");
        assert_eq!(CastlingRights::NONE.to_fen(), "-");
        let white_king_only = CastlingRights::NONE.grant(Color::White, File::H);
        assert_eq!(white_king_only.to_fen(), "K");
        assert_eq!(format!("{white_king_only}"), "K");
    }
}
