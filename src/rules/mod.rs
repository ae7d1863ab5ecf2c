//! Thin adapter over the `shakmaty` rules engine.
//!
//! The rest of the crate never touches move generation directly; it asks this
//! module for legal targets, applies moves, and reads back termination and
//! notation. The adapter also keeps the repetition ledger that `shakmaty`
//! positions do not carry on their own.

use std::collections::HashMap;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square};
use thiserror::Error;

/// Half-moves without a capture or pawn move before the game is drawn outright.
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;
/// Occurrences of one position before the game is drawn outright.
const FIVEFOLD: u32 = 5;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("illegal move {uci} in position {fen}")]
    IllegalMove { uci: String, fen: String },
    #[error("invalid fen {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// Automatic (non-claimable) ways a game can end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnding {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl GameEnding {
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameEnding::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }

    /// Result token as written in a PGN `Result` tag.
    pub fn result_str(&self) -> &'static str {
        match self.winner() {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            GameEnding::Checkmate { .. } => "Checkmate",
            GameEnding::Stalemate => "Stalemate",
            GameEnding::InsufficientMaterial => "Draw by insufficient material",
            GameEnding::SeventyFiveMoves => "Draw by the seventy-five-move rule",
            GameEnding::FivefoldRepetition => "Draw by fivefold repetition",
        }
    }
}

/// One game's position plus the history needed to judge repetition.
#[derive(Clone, Debug)]
pub struct Game {
    position: Chess,
    repetitions: HashMap<String, u32>,
}

impl Default for Game {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Chess) -> Self {
        let mut game = Self {
            position,
            repetitions: HashMap::new(),
        };
        game.record_repetition();
        game
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let invalid = |reason: String| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{}", e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{}", e)))?;
        Ok(Self::from_position(position))
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Plies played so far, counted the same way for either side to move.
    pub fn ply(&self) -> u32 {
        ply_of(&self.position)
    }

    pub fn fen(&self) -> String {
        fen_of(&self.position)
    }

    pub fn piece_color_at(&self, square: Square) -> Option<Color> {
        self.position.board().piece_at(square).map(|piece| piece.color)
    }

    /// Destination squares of every legal move starting on `from`.
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .position
            .legal_moves()
            .into_iter()
            .filter_map(|m| match normal_squares(m) {
                Some((origin, to, _)) if origin == from => Some(to),
                _ => None,
            })
            .collect();
        targets.dedup();
        targets
    }

    /// Finds the legal move for a two-click (origin, destination) gesture.
    /// Pawn moves onto the last rank promote to a queen.
    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        self.position
            .legal_moves()
            .into_iter()
            .find(|m| match normal_squares(*m) {
                Some((origin, target, promotion)) => {
                    origin == from && target == to && matches!(promotion, None | Some(Role::Queen))
                }
                None => false,
            })
    }

    pub fn is_legal(&self, m: Move) -> bool {
        self.position.legal_moves().contains(&m)
    }

    pub fn apply(&mut self, m: Move) -> Result<(), RulesError> {
        if !self.is_legal(m) {
            return Err(RulesError::IllegalMove {
                uci: uci_of(m),
                fen: self.fen(),
            });
        }
        self.position.play_unchecked(m);
        self.record_repetition();
        Ok(())
    }

    /// Standard short-form notation of `m` in the current position.
    pub fn san(&self, m: Move) -> String {
        SanPlus::from_move(self.position.clone(), m).to_string()
    }

    pub fn ending(&self) -> Option<GameEnding> {
        let position = &self.position;
        if position.is_checkmate() {
            return Some(GameEnding::Checkmate {
                winner: !position.turn(),
            });
        }
        if position.is_stalemate() {
            return Some(GameEnding::Stalemate);
        }
        if position.is_insufficient_material() {
            return Some(GameEnding::InsufficientMaterial);
        }
        if position.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES {
            return Some(GameEnding::SeventyFiveMoves);
        }
        let occurrences = self
            .repetitions
            .get(&repetition_key(position))
            .copied()
            .unwrap_or(0);
        if occurrences >= FIVEFOLD {
            return Some(GameEnding::FivefoldRepetition);
        }
        None
    }

    pub fn is_over(&self) -> bool {
        self.ending().is_some()
    }

    fn record_repetition(&mut self) {
        *self
            .repetitions
            .entry(repetition_key(&self.position))
            .or_insert(0) += 1;
    }
}

pub fn fen_of(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

pub fn ply_of(position: &Chess) -> u32 {
    let plies = position.fullmoves().get() * 2;
    match position.turn() {
        Color::White => plies - 1,
        Color::Black => plies,
    }
}

pub fn uci_of(m: Move) -> String {
    UciMove::from_standard(m).to_string()
}

/// Parses UCI text (`e2e4`, `e7e8q`, `e1g1`) into a legal move of `position`.
pub fn move_from_uci(position: &Chess, text: &str) -> Option<Move> {
    let uci: UciMove = text.parse().ok()?;
    uci.to_move(position).ok()
}

/// Origin and destination of a move as a player would click them.
pub fn move_squares(m: Move) -> Option<(Square, Square)> {
    normal_squares(m).map(|(from, to, _)| (from, to))
}

/// Origin, king-style destination, and promotion of a move. Castling is
/// reported as the king's two-square step so it matches what a player clicks.
fn normal_squares(m: Move) -> Option<(Square, Square, Option<Role>)> {
    match UciMove::from_standard(m) {
        UciMove::Normal {
            from,
            to,
            promotion,
        } => Some((from, to, promotion)),
        _ => None,
    }
}

/// Board, side to move, castling rights and en passant square; clocks excluded.
fn repetition_key(position: &Chess) -> String {
    fen_of(position)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}
