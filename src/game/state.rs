use shakmaty::{Color, Move, Square};

use crate::rules::{Game, GameEnding};

/// Where one game stands. Derived from the board and the stored previews on
/// every tick rather than tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingHuman,
    AiPreviewPending,
    AiToMove,
    GameOver,
}

/// One game in progress. Replaced wholesale on reset.
#[derive(Debug, Clone)]
pub struct TurnState {
    pub game: Game,
    pub human_color: Color,
    pub selection: Option<Square>,
    pub legal_targets: Vec<Square>,
    /// One entry per ply.
    pub move_history: Vec<Move>,
    /// Standard notation of `move_history`, index-aligned.
    pub notation_history: Vec<String>,
    /// Candidate engine lines for the current engine turn; `None` until computed.
    pub pending_previews: Option<Vec<(Move, i32)>>,
    pub last_move_delta: Option<i32>,
    /// Preview score of the engine's last move, when it was one of the previewed lines.
    pub last_engine_hint: Option<i32>,
    /// Index-aligned with `move_history`; engine plies stay `None`.
    pub commentary_by_ply: Vec<Option<String>>,
    pub latest_commentary: Option<String>,
    /// Outcome score from the human's side, set once at settlement.
    pub result: Option<f64>,
    pub ending: Option<GameEnding>,
    /// Distinguishes this game from earlier ones for late commentary.
    pub generation: u64,
}

impl TurnState {
    pub fn new(human_color: Color, generation: u64) -> Self {
        Self {
            game: Game::new(),
            human_color,
            selection: None,
            legal_targets: Vec::new(),
            move_history: Vec::new(),
            notation_history: Vec::new(),
            pending_previews: None,
            last_move_delta: None,
            last_engine_hint: None,
            commentary_by_ply: Vec::new(),
            latest_commentary: None,
            result: None,
            ending: None,
            generation,
        }
    }

    pub fn engine_color(&self) -> Color {
        !self.human_color
    }

    pub fn phase(&self) -> Phase {
        if self.game.is_over() {
            Phase::GameOver
        } else if self.game.turn() == self.human_color {
            Phase::AwaitingHuman
        } else if self.pending_previews.is_none() {
            Phase::AiPreviewPending
        } else {
            Phase::AiToMove
        }
    }

    pub fn last_move(&self) -> Option<Move> {
        self.move_history.last().cloned()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.legal_targets.clear();
    }

    /// Appends one ply to every per-ply history at once so they stay aligned.
    pub(crate) fn push_ply(&mut self, m: Move, san: String) -> usize {
        self.move_history.push(m);
        self.notation_history.push(san);
        self.commentary_by_ply.push(None);
        self.move_history.len() - 1
    }
}
