//! SAN generation and parsing.
//!
//! One anchored regular expression fixes the overall shape of a notation;
//! the named alternatives are then interpreted against the position. The
//! tolerant mode (the default) ignores cosmetic imprecision — capture
//! markers, the '=' before a promotion piece, check suffixes, redundant
//! disambiguation — while the strict mode requires the exact text the
//! generator would emit.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::castle_rights::CastleSide;
use crate::chess_move::{Move, MoveKind};
use crate::error::{NotationError, NotationReason};
use crate::fen::render_fen;
use crate::piece::Piece;
use crate::piece_kind::PieceKind;
use crate::position::Position;
use crate::square::{File, Rank, Square};

static SAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?P<queenside>O-O-O)",
        r"|(?P<kingside>O-O)",
        r"|(?P<piece>[KQRBN])(?P<disfile>[a-h])?(?P<disrank>[1-8])?",
        r"(?P<pcapture>x)?(?P<pdest>[a-h][1-8])",
        r"|(?:(?P<srcfile>[a-h])(?P<capture>x)?)?(?P<dest>[a-h][1-8])",
        r"(?:(?P<equals>=)?(?P<promotion>[QRBN]))?",
        r")(?P<check>[+#])?$",
    ))
    .expect("the SAN expression is well-formed")
});

fn group_char(caps: &Captures<'_>, name: &str) -> Option<char> {
    caps.name(name).and_then(|m| m.as_str().chars().next())
}

fn group_str<'a>(caps: &'a Captures<'_>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}

impl Position {
    /// Render a move in standard algebraic notation, including the minimal
    /// disambiguation symbol and the check/checkmate suffix.
    ///
    /// The descriptor must originate from this position.
    pub fn san(&mut self, mv: Move) -> String {
        self.refresh_legality();
        let mut san = String::with_capacity(8);
        if mv.is_castling() {
            san.push_str(if mv.to().file() > mv.from().file() {
                "O-O"
            } else {
                "O-O-O"
            });
        } else if mv.piece().kind() == PieceKind::Pawn {
            if mv.is_capture() {
                san.push(mv.from().file().to_char());
                san.push('x');
            }
            san.push_str(&mv.to().to_string());
            if let Some(promoted) = mv.promotion() {
                san.push('=');
                san.push(promoted.letter());
            }
        } else {
            san.push(mv.piece().kind().letter());
            san.push_str(&self.disambiguation(mv));
            if mv.is_capture() {
                san.push('x');
            }
            san.push_str(&mv.to().to_string());
        }
        san.push_str(self.move_suffix(mv));
        san
    }

    /// The minimal disambiguation symbol for a non-pawn move: nothing when
    /// the mover is the only king-safe attacker of the target, otherwise
    /// the file letter, the rank digit when another attacker shares the
    /// file, or the full square when both coordinates are shared.
    fn disambiguation(&mut self, mv: Move) -> String {
        let mut others = self.attackers_of(mv.to(), mv.piece());
        others.retain(|&sq| sq != mv.from());
        others.retain(|&sq| self.king_safe_after(sq, mv.to(), None));
        if others.is_empty() {
            return String::new();
        }
        let shares_file = others.iter().any(|sq| sq.file() == mv.from().file());
        let shares_rank = others.iter().any(|sq| sq.rank() == mv.from().rank());
        if shares_file {
            if shares_rank {
                mv.from().to_string()
            } else {
                mv.from().rank().to_char().to_string()
            }
        } else {
            mv.from().file().to_char().to_string()
        }
    }

    /// "+" when the move gives check, "#" when it mates, "" otherwise.
    fn move_suffix(&self, mv: Move) -> &'static str {
        let mut next = *self;
        next.play(mv);
        if next.is_check() {
            if next.has_move() { "+" } else { "#" }
        } else {
            ""
        }
    }

    /// Parse a SAN string in tolerant mode.
    pub fn parse_san(&mut self, notation: &str) -> Result<Move, NotationError> {
        self.parse_notation(notation, false)
    }

    /// Parse a SAN string in strict mode: capture marker iff the move
    /// captures, '=' before the promotion piece, minimal disambiguation,
    /// and the exactly correct check/checkmate suffix.
    pub fn parse_san_strict(&mut self, notation: &str) -> Result<Move, NotationError> {
        self.parse_notation(notation, true)
    }

    /// Parse a SAN string tolerantly and play it.
    ///
    /// Notation failures are swallowed into `false`; the position is left
    /// untouched in that case.
    pub fn play_san(&mut self, notation: &str) -> bool {
        match self.parse_san(notation) {
            Ok(mv) => {
                self.play(mv);
                true
            }
            Err(error) => {
                debug!(notation, reason = %error.reason, "rejected SAN input");
                false
            }
        }
    }

    fn err(&self, notation: &str, reason: NotationReason) -> NotationError {
        NotationError {
            position: render_fen(self, 0, 1),
            notation: notation.to_string(),
            reason,
        }
    }

    fn parse_notation(&mut self, notation: &str, strict: bool) -> Result<Move, NotationError> {
        if !self.is_legal() {
            return Err(self.err(notation, NotationReason::IllegalPosition));
        }
        let caps = SAN
            .captures(notation)
            .ok_or_else(|| self.err(notation, NotationReason::InvalidSyntax))?;

        let mv = if caps.name("queenside").is_some() {
            self.parse_castling(notation, CastleSide::QueenSide)?
        } else if caps.name("kingside").is_some() {
            self.parse_castling(notation, CastleSide::KingSide)?
        } else if caps.name("piece").is_some() {
            self.parse_piece_move(notation, &caps, strict)?
        } else {
            self.parse_pawn_move(notation, &caps, strict)?
        };

        if strict {
            let expected = self.move_suffix(mv);
            let given = group_str(&caps, "check");
            if given != expected {
                return Err(self.err(
                    notation,
                    NotationReason::WrongCheckSymbol {
                        expected: expected.to_string(),
                    },
                ));
            }
        }
        Ok(mv)
    }

    fn parse_castling(
        &mut self,
        notation: &str,
        side: CastleSide,
    ) -> Result<Move, NotationError> {
        let turn = self.turn();
        let Some(from) = self.king_square(turn) else {
            return Err(self.err(notation, NotationReason::IllegalCastling { side }));
        };
        let delta: i16 = match side {
            CastleSide::KingSide => 2,
            CastleSide::QueenSide => -2,
        };
        from.offset(delta)
            .and_then(|to| self.castling_move(from, to))
            .ok_or_else(|| self.err(notation, NotationReason::IllegalCastling { side }))
    }

    fn parse_piece_move(
        &mut self,
        notation: &str,
        caps: &Captures<'_>,
        strict: bool,
    ) -> Result<Move, NotationError> {
        let turn = self.turn();
        let Some(kind) = group_char(caps, "piece").and_then(PieceKind::from_letter) else {
            return Err(self.err(notation, NotationReason::InvalidSyntax));
        };
        let Some(dest) = Square::from_algebraic(group_str(caps, "pdest")) else {
            return Err(self.err(notation, NotationReason::InvalidSyntax));
        };
        let piece = Piece::new(kind, turn);

        let mut candidates = self.attackers_of(dest, piece);
        if let Some(file) = group_char(caps, "disfile").and_then(File::from_char) {
            candidates.retain(|sq| sq.file() == file);
        }
        if let Some(rank) = group_char(caps, "disrank").and_then(Rank::from_char) {
            candidates.retain(|sq| sq.rank() == rank);
        }
        let destination = self.piece_on(dest);
        if destination.is_some_and(|p| p.color() == turn) || candidates.is_empty() {
            return Err(self.err(
                notation,
                NotationReason::NoPieceCanMove { piece: kind, to: dest },
            ));
        }

        candidates.retain(|&from| self.king_safe_after(from, dest, None));
        let from = match candidates.as_slice() {
            [] => return Err(self.err(notation, NotationReason::NotSafeForKing)),
            [only] => *only,
            _ => {
                return Err(self.err(
                    notation,
                    NotationReason::RequiresDisambiguation { piece: kind, to: dest },
                ));
            }
        };
        let move_kind = match destination {
            Some(victim) => MoveKind::Capture { victim },
            None => MoveKind::Normal,
        };
        let mv = Move::new(from, dest, piece, move_kind);

        if strict {
            let has_capture_symbol = caps.name("pcapture").is_some();
            if mv.is_capture() && !has_capture_symbol {
                return Err(self.err(notation, NotationReason::MissingCaptureSymbol));
            }
            if !mv.is_capture() && has_capture_symbol {
                return Err(self.err(notation, NotationReason::UnexpectedCaptureSymbol));
            }
            let given = format!(
                "{}{}",
                group_str(caps, "disfile"),
                group_str(caps, "disrank")
            );
            let expected = self.disambiguation(mv);
            if given != expected {
                return Err(self.err(notation, NotationReason::WrongDisambiguation { expected }));
            }
        }
        Ok(mv)
    }

    fn parse_pawn_move(
        &mut self,
        notation: &str,
        caps: &Captures<'_>,
        strict: bool,
    ) -> Result<Move, NotationError> {
        let turn = self.turn();
        let pawn = Piece::new(PieceKind::Pawn, turn);
        let Some(dest) = Square::from_algebraic(group_str(caps, "dest")) else {
            return Err(self.err(notation, NotationReason::InvalidSyntax));
        };
        let src_file = group_char(caps, "srcfile").and_then(File::from_char);
        let no_pawn = |this: &Position| {
            this.err(
                notation,
                NotationReason::NoPieceCanMove {
                    piece: PieceKind::Pawn,
                    to: dest,
                },
            )
        };

        let (from, kind) = match src_file {
            Some(file) if file != dest.file() => {
                // A capture names the source file next to the destination.
                if (file.index() as i16 - dest.file().index() as i16).abs() != 1 {
                    return Err(no_pawn(self));
                }
                let Some(behind) = dest.offset(-turn.pawn_step()) else {
                    return Err(no_pawn(self));
                };
                let from = Square::new(behind.rank(), file);
                if self.piece_on(from) != Some(pawn) {
                    return Err(no_pawn(self));
                }
                match self.piece_on(dest) {
                    Some(victim) if victim.color() != turn => {
                        (from, MoveKind::Capture { victim })
                    }
                    Some(_) => return Err(no_pawn(self)),
                    None => {
                        if self.en_passant_file() == Some(dest.file())
                            && dest.rank() == turn.en_passant_rank()
                        {
                            let captured = Square::new(from.rank(), dest.file());
                            (from, MoveKind::EnPassant { captured })
                        } else {
                            return Err(no_pawn(self));
                        }
                    }
                }
            }
            _ => {
                // An advance; a redundant source file naming the destination
                // file is tolerated.
                if self.piece_on(dest).is_some() {
                    return Err(no_pawn(self));
                }
                let Some(one_back) = dest.offset(-turn.pawn_step()) else {
                    return Err(no_pawn(self));
                };
                match self.piece_on(one_back) {
                    Some(p) if p == pawn => (one_back, MoveKind::Normal),
                    Some(_) => return Err(no_pawn(self)),
                    None => {
                        if dest.rank() != turn.double_push_rank() {
                            return Err(no_pawn(self));
                        }
                        let Some(two_back) = one_back.offset(-turn.pawn_step()) else {
                            return Err(no_pawn(self));
                        };
                        if self.piece_on(two_back) != Some(pawn) {
                            return Err(no_pawn(self));
                        }
                        (two_back, MoveKind::DoublePawnPush)
                    }
                }
            }
        };

        let en_passant_capture = match kind {
            MoveKind::EnPassant { captured } => Some(captured),
            _ => None,
        };
        if !self.king_safe_after(from, dest, en_passant_capture) {
            return Err(self.err(notation, NotationReason::NotSafeForKing));
        }

        let promotion = group_char(caps, "promotion").and_then(PieceKind::from_letter);
        let mv = if dest.rank() == turn.promotion_rank() {
            let Some(promoted) = promotion else {
                return Err(self.err(notation, NotationReason::MissingPromotion));
            };
            let captured = match kind {
                MoveKind::Capture { victim } => Some(victim),
                _ => None,
            };
            Move::new(
                from,
                dest,
                pawn,
                MoveKind::Promotion { promoted, captured },
            )
        } else {
            if promotion.is_some() {
                return Err(self.err(notation, NotationReason::IllegalPromotion));
            }
            Move::new(from, dest, pawn, kind)
        };

        if strict {
            let has_capture_symbol = caps.name("capture").is_some();
            if mv.is_capture() && !has_capture_symbol {
                return Err(self.err(notation, NotationReason::MissingCaptureSymbol));
            }
            if !mv.is_capture() && has_capture_symbol {
                return Err(self.err(notation, NotationReason::UnexpectedCaptureSymbol));
            }
            if src_file.is_some() && !mv.is_capture() {
                return Err(self.err(
                    notation,
                    NotationReason::WrongDisambiguation {
                        expected: String::new(),
                    },
                ));
            }
            if mv.is_promotion() && caps.name("equals").is_none() {
                return Err(self.err(notation, NotationReason::MissingPromotionSymbol));
            }
        }
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::NotationReason;
    use crate::piece_kind::PieceKind;
    use crate::position::Position;
    use crate::square::Square;

    fn parse(fen: &str) -> Position {
        fen.parse().expect("test FEN must parse")
    }

    fn reason(position: &mut Position, notation: &str) -> NotationReason {
        position
            .parse_san(notation)
            .expect_err("notation should fail")
            .reason
    }

    #[test]
    fn opening_moves() {
        let mut position = Position::starting_position();
        let e4 = position.parse_san("e4").unwrap();
        assert_eq!(e4.from(), Square::E2);
        assert_eq!(e4.to(), Square::E4);
        assert!(e4.is_double_pawn_push());

        let nf3 = position.parse_san("Nf3").unwrap();
        assert_eq!(nf3.from(), Square::G1);
        assert_eq!(nf3.to(), Square::F3);
        assert_eq!(position.san(nf3), "Nf3");
    }

    #[test]
    fn fools_mate() {
        let mut position = Position::starting_position();
        assert!(position.play_san("f3"));
        assert!(position.play_san("e5"));
        assert!(position.play_san("g4"));
        assert!(position.play_san("Qh4"));
        assert!(position.is_checkmate());
    }

    #[test]
    fn fools_mate_final_move_renders_with_mate_suffix() {
        let mut position = Position::starting_position();
        for notation in ["f3", "e5", "g4"] {
            assert!(position.play_san(notation));
        }
        let mate = position.parse_san("Qh4#").unwrap();
        assert_eq!(position.san(mate), "Qh4#");
        assert!(position.parse_san_strict("Qh4#").is_ok());
        assert!(matches!(
            position.parse_san_strict("Qh4").unwrap_err().reason,
            NotationReason::WrongCheckSymbol { .. }
        ));
    }

    #[test]
    fn castling_notation_both_sides() {
        let mut position = parse("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let kingside = position.parse_san("O-O").unwrap();
        assert_eq!(kingside.to(), Square::G1);
        assert_eq!(position.san(kingside), "O-O");
        let queenside = position.parse_san("O-O-O").unwrap();
        assert_eq!(queenside.to(), Square::C1);
        assert_eq!(position.san(queenside), "O-O-O");
    }

    #[test]
    fn castling_through_check_fails() {
        // A rook on the f-file covers the king's pass-through square f8.
        let mut position = parse("r3k2r/8/8/8/8/8/5R2/5K2 b kq - 0 1");
        assert!(!position.play_san("O-O"));
        assert!(matches!(
            reason(&mut position, "O-O"),
            NotationReason::IllegalCastling { .. }
        ));
        assert!(position.play_san("O-O-O"));
    }

    #[test]
    fn pawn_captures_need_the_source_file() {
        let mut position = parse("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        let capture = position.parse_san("exd5").unwrap();
        assert_eq!(capture.from(), Square::E4);
        assert!(capture.is_capture());
        assert_eq!(position.san(capture), "exd5");
        // Tolerant mode accepts a missing capture marker.
        assert_eq!(position.parse_san("ed5").unwrap(), capture);
        assert!(matches!(
            position.parse_san_strict("ed5").unwrap_err().reason,
            NotationReason::MissingCaptureSymbol
        ));
    }

    #[test]
    fn en_passant_by_notation() {
        let mut position = parse("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let mv = position.parse_san("exd6").unwrap();
        assert!(mv.is_en_passant());
        assert_eq!(mv.en_passant_square(), Some(Square::D5));
        assert_eq!(position.san(mv), "exd6");
    }

    #[test]
    fn promotion_notation() {
        let mut position = parse("3n4/4P1k1/8/8/8/8/6K1/8 w - - 0 1");
        let push = position.parse_san("e8=Q").unwrap();
        assert_eq!(push.promotion(), Some(PieceKind::Queen));
        assert!(!push.is_capture());
        let capture = position.parse_san("exd8=N").unwrap();
        assert_eq!(capture.promotion(), Some(PieceKind::Knight));
        assert!(capture.is_capture());

        // Tolerant mode accepts a missing '='.
        assert_eq!(position.parse_san("e8Q").unwrap(), push);
        assert!(matches!(
            position.parse_san_strict("e8Q").unwrap_err().reason,
            NotationReason::MissingPromotionSymbol
        ));

        assert!(matches!(
            reason(&mut position, "e8"),
            NotationReason::MissingPromotion
        ));
    }

    #[test]
    fn promotion_suffix_off_the_last_rank_is_rejected() {
        let mut position = Position::starting_position();
        assert!(matches!(
            reason(&mut position, "e4=Q"),
            NotationReason::IllegalPromotion
        ));
    }

    #[test]
    fn file_disambiguation() {
        // Knights on b1 and f3 both reach d2.
        let mut position = parse("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        let mv = position.parse_san("Nbd2").unwrap();
        assert_eq!(mv.from(), Square::B1);
        assert_eq!(position.san(mv), "Nbd2");
        let other = position.parse_san("Nfd2").unwrap();
        assert_eq!(other.from(), Square::F3);

        assert!(matches!(
            reason(&mut position, "Nd2"),
            NotationReason::RequiresDisambiguation { .. }
        ));
    }

    #[test]
    fn rank_disambiguation_when_the_file_is_shared() {
        // Rooks on a1 and a5 both reach a3.
        let mut position = parse("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        let mv = position.parse_san("R1a3").unwrap();
        assert_eq!(mv.from(), Square::A1);
        assert_eq!(position.san(mv), "R1a3");
        let other = position.parse_san("R5a3").unwrap();
        assert_eq!(position.san(other), "R5a3");
    }

    #[test]
    fn full_square_disambiguation() {
        // Queens on e4, h4, and e7 all reach h7; the e4 mover shares its
        // file with one and its rank with the other.
        let mut position = parse("8/4Q3/8/8/4Q2Q/8/8/k5K1 w - - 0 1");
        let mv = position.parse_san("Qe4h7").unwrap();
        assert_eq!(mv.from(), Square::E4);
        assert_eq!(position.san(mv), "Qe4h7");
    }

    #[test]
    fn pinned_pieces_do_not_force_disambiguation() {
        // The e4 knight is pinned to the king, so the b1 knight's move
        // needs no qualifier.
        let mut position = parse("4r2k/8/8/8/4N3/8/8/1N2K3 w - - 0 1");
        let mv = position.parse_san("Nd2").unwrap();
        assert_eq!(mv.from(), Square::B1);
        assert_eq!(position.san(mv), "Nd2");
        // The redundant qualifier stays acceptable in tolerant mode only.
        assert_eq!(position.parse_san("Nbd2").unwrap(), mv);
        assert!(matches!(
            position.parse_san_strict("Nbd2").unwrap_err().reason,
            NotationReason::WrongDisambiguation { .. }
        ));
    }

    #[test]
    fn pinned_only_candidate_is_not_safe() {
        let mut position = parse("4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(matches!(
            reason(&mut position, "Nc3"),
            NotationReason::NotSafeForKing
        ));
    }

    #[test]
    fn no_piece_can_move() {
        let mut position = Position::starting_position();
        assert!(matches!(
            reason(&mut position, "Ne4"),
            NotationReason::NoPieceCanMove {
                piece: PieceKind::Knight,
                ..
            }
        ));
        assert!(matches!(
            reason(&mut position, "e6"),
            NotationReason::NoPieceCanMove { .. }
        ));
    }

    #[test]
    fn syntax_and_position_errors() {
        let mut position = Position::starting_position();
        assert!(matches!(
            reason(&mut position, "hello"),
            NotationReason::InvalidSyntax
        ));
        let mut illegal = Position::empty();
        assert!(matches!(
            illegal.parse_san("e4").unwrap_err().reason,
            NotationReason::IllegalPosition
        ));
    }

    #[test]
    fn tolerant_ignores_cosmetic_noise() {
        let mut position = Position::starting_position();
        let quiet = position.parse_san("Nf3").unwrap();
        // Extra capture marker and wrong check marker are ignored.
        assert_eq!(position.parse_san("Nxf3").unwrap(), quiet);
        assert_eq!(position.parse_san("Nf3+").unwrap(), quiet);
        assert_eq!(position.parse_san("Ngf3").unwrap(), quiet);
        // Strict mode rejects each.
        assert!(matches!(
            position.parse_san_strict("Nxf3").unwrap_err().reason,
            NotationReason::UnexpectedCaptureSymbol
        ));
        assert!(matches!(
            position.parse_san_strict("Nf3+").unwrap_err().reason,
            NotationReason::WrongCheckSymbol { .. }
        ));
        assert!(matches!(
            position.parse_san_strict("Ngf3").unwrap_err().reason,
            NotationReason::WrongDisambiguation { .. }
        ));
        assert!(position.parse_san_strict("Nf3").is_ok());
    }

    #[test]
    fn play_san_reports_failure_without_mutating() {
        let mut position = Position::starting_position();
        let before = position;
        assert!(!position.play_san("Ke4"));
        assert_eq!(position, before);
        assert!(position.play_san("e4"));
        assert_ne!(position, before);
    }

    #[test]
    fn notation_roundtrip_tolerant_and_strict() {
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
        ];
        for fen in fens {
            let mut position: Position = fen.parse().unwrap();
            for mv in position.moves() {
                let san = position.san(mv);
                // Strict parsing recovers exactly the generated move.
                let strict = position
                    .parse_san_strict(&san)
                    .unwrap_or_else(|e| panic!("strict parse of {san} failed: {e}"));
                assert_eq!(strict, mv, "strict roundtrip failed for {san} in {fen}");
                // Tolerant parsing agrees and re-renders identically.
                let tolerant = position.parse_san(&san).unwrap();
                assert_eq!(position.san(tolerant), san);
            }
        }
    }

    #[test]
    fn en_passant_file_without_capture_has_no_notation_effect() {
        // The en passant file is set but no black pawn stands beside e4,
        // so no capture notation resolves.
        let mut position =
            parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert!(matches!(
            reason(&mut position, "dxe3"),
            NotationReason::NoPieceCanMove { .. }
        ));
        assert!(matches!(
            reason(&mut position, "fxe3"),
            NotationReason::NoPieceCanMove { .. }
        ));
    }
}
