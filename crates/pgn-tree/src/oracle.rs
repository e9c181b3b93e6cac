//! Position oracle: the chess-rules collaborator the tree builder consults.
//!
//! The tree never implements chess rules itself. Legality, disambiguation,
//! check detection and FEN rendering all come from a [`PositionOracle`];
//! [`ShakmatyOracle`] is the standard-chess implementation.

use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen, san::San, san::SanPlus, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode,
    Move, Position, Role,
};

use crate::error::OracleError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Side to move, or the side that made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

/// A move as applied by the oracle, with the metadata the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    /// Canonical SAN including any check/mate suffix.
    pub san: String,
    /// Coordinate form, e.g. `e2e4`, `e7e8q`, `e1g1`.
    pub uci: String,
    pub from: String,
    pub to: String,
    pub color: Side,
    /// Lower-case piece letter (`p`, `n`, `b`, `r`, `q`, `k`).
    pub piece: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

/// Applies moves to positions and describes positions.
pub trait PositionOracle {
    type Position: Clone;

    fn initial_position(&self) -> Self::Position;

    fn position_from_fen(&self, fen: &str) -> Result<Self::Position, OracleError>;

    /// Apply a SAN or coordinate move. Returns the applied move and the
    /// resulting position, or an error if the move is unparseable or illegal.
    fn apply_move(
        &self,
        position: &Self::Position,
        notation: &str,
    ) -> Result<(AppliedMove, Self::Position), OracleError>;

    fn position_to_fen(&self, position: &Self::Position) -> String;

    fn turn_of(&self, position: &Self::Position) -> Side;
}

/// Standard chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl PositionOracle for ShakmatyOracle {
    type Position = Chess;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn position_from_fen(&self, fen: &str) -> Result<Chess, OracleError> {
        let invalid = |reason: String| OracleError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))
    }

    fn apply_move(
        &self,
        position: &Chess,
        notation: &str,
    ) -> Result<(AppliedMove, Chess), OracleError> {
        let mv = resolve_move(position, notation)?;

        let color = Side::from(position.turn());
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        let san = San::from_move(position, mv.clone()).to_string();

        let mut next = position.clone();
        next.play_unchecked(mv.clone());

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };

        let applied = AppliedMove {
            san: format!("{san}{suffix}"),
            from: uci.get(0..2).unwrap_or_default().to_string(),
            to: uci.get(2..4).unwrap_or_default().to_string(),
            uci,
            color,
            piece: mv.role().char(),
            captured: mv.capture().map(Role::char),
            promotion: mv.promotion().map(Role::char),
        };

        Ok((applied, next))
    }

    fn position_to_fen(&self, position: &Chess) -> String {
        Fen::from_position(position, EnPassantMode::Legal).to_string()
    }

    fn turn_of(&self, position: &Chess) -> Side {
        position.turn().into()
    }
}

/// Parse SAN first, then UCI, and resolve against the legal moves of `position`.
fn resolve_move(position: &Chess, notation: &str) -> Result<Move, OracleError> {
    let cleaned = clean_notation(notation);
    let illegal = |reason: String| OracleError::IllegalMove {
        notation: notation.to_string(),
        reason,
    };

    let san_error = match cleaned.parse::<SanPlus>() {
        Ok(san_plus) => match san_plus.san.to_move(position) {
            Ok(mv) => return Ok(mv),
            Err(e) => Some(e.to_string()),
        },
        Err(_) => None,
    };

    // Coordinate moves such as `e1g1` can also read as SAN.
    match cleaned.parse::<UciMove>() {
        Ok(uci) => uci
            .to_move(position)
            .map_err(|e| illegal(san_error.unwrap_or_else(|| e.to_string()))),
        Err(_) => Err(match san_error {
            Some(reason) => illegal(reason),
            None => OracleError::InvalidNotation {
                notation: notation.to_string(),
                reason: "neither SAN nor coordinate notation".to_string(),
            },
        }),
    }
}

/// Drop move-quality glyphs (`!`, `?`) and accept `0-0`/`0-0-0` castling.
fn clean_notation(notation: &str) -> String {
    let trimmed = notation.trim().trim_end_matches(['!', '?']);
    if trimmed.starts_with("0-0") {
        trimmed.replace('0', "O")
    } else {
        trimmed.to_string()
    }
}

/// Side to move recorded in a FEN string. Defaults to white when the field
/// is missing or unreadable.
pub fn fen_turn(fen: &str) -> Side {
    match fen.split_whitespace().nth(1) {
        Some("b") => Side::Black,
        _ => Side::White,
    }
}

/// Full-move number recorded in a FEN string, defaulting to 1.
pub fn fen_fullmove(fen: &str) -> u32 {
    fen.split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_san_move() {
        let oracle = ShakmatyOracle;
        let start = oracle.initial_position();
        let (mv, next) = oracle.apply_move(&start, "e4").unwrap();
        assert_eq!(mv.san, "e4");
        assert_eq!(mv.uci, "e2e4");
        assert_eq!(mv.from, "e2");
        assert_eq!(mv.to, "e4");
        assert_eq!(mv.color, Side::White);
        assert_eq!(mv.piece, 'p');
        assert_eq!(oracle.turn_of(&next), Side::Black);
        assert_eq!(
            oracle.position_to_fen(&next),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_apply_coordinate_move() {
        let oracle = ShakmatyOracle;
        let start = oracle.initial_position();
        let (mv, _) = oracle.apply_move(&start, "g1f3").unwrap();
        assert_eq!(mv.san, "Nf3");
        assert_eq!(mv.piece, 'n');
    }

    #[test]
    fn test_check_suffix_and_glyphs() {
        let oracle = ShakmatyOracle;
        let mut pos = oracle.initial_position();
        for san in ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6?"] {
            pos = oracle.apply_move(&pos, san).unwrap().1;
        }
        let (mate, _) = oracle.apply_move(&pos, "Qxf7!!").unwrap();
        assert_eq!(mate.san, "Qxf7#");
        assert_eq!(mate.captured, Some('p'));
    }

    #[test]
    fn test_zero_castling() {
        let oracle = ShakmatyOracle;
        let mut pos = oracle.initial_position();
        for san in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"] {
            pos = oracle.apply_move(&pos, san).unwrap().1;
        }
        let (castle, _) = oracle.apply_move(&pos, "0-0").unwrap();
        assert_eq!(castle.san, "O-O");
        assert_eq!(castle.uci, "e1g1");
        assert_eq!(castle.piece, 'k');

        let (by_coordinates, _) = oracle.apply_move(&pos, "e1g1").unwrap();
        assert_eq!(by_coordinates.san, "O-O");
    }

    #[test]
    fn test_illegal_and_invalid_moves() {
        let oracle = ShakmatyOracle;
        let start = oracle.initial_position();
        assert!(matches!(
            oracle.apply_move(&start, "e5"),
            Err(OracleError::IllegalMove { .. })
        ));
        assert!(matches!(
            oracle.apply_move(&start, "Zz9"),
            Err(OracleError::InvalidNotation { .. })
        ));
    }

    #[test]
    fn test_position_from_fen() {
        let oracle = ShakmatyOracle;
        let pos = oracle.position_from_fen(STANDARD_START_FEN).unwrap();
        assert_eq!(oracle.position_to_fen(&pos), STANDARD_START_FEN);
        assert!(oracle.position_from_fen("not a fen").is_err());
    }

    #[test]
    fn test_fen_fields() {
        assert_eq!(fen_turn(STANDARD_START_FEN), Side::White);
        assert_eq!(fen_turn("8/8/8/8/8/8/8/K1k5 b - - 0 42"), Side::Black);
        assert_eq!(fen_fullmove("8/8/8/8/8/8/8/K1k5 b - - 0 42"), 42);
        assert_eq!(fen_fullmove("8/8/8/8/8/8/8/K1k5 b"), 1);
    }
}
