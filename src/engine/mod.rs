//! The external move-search engine, as seen by the adaptive core.
//!
//! Anything that can analyse a position and pick a move implements
//! [`SearchEngine`]. [`UciEngine`] drives a real engine binary over UCI;
//! [`EngineSession`] layers strength control and move choice on top of any
//! implementation.

pub mod info_parser;
pub mod session;
pub mod uci;

#[cfg(test)]
pub(crate) mod testing;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use shakmaty::{Chess, Color, Move};
use thiserror::Error;

pub use session::{skill_level_for, strength_setting, EngineSession, StrengthSetting};
pub use uci::UciEngine;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start engine {path:?}: {source}")]
    Spawn { path: PathBuf, source: io::Error },
    #[error("engine io error: {0}")]
    Io(#[from] io::Error),
    #[error("engine did not answer in time while waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },
    #[error("engine closed its output")]
    Closed,
    #[error("engine protocol error: {0}")]
    Protocol(String),
    #[error("engine returned no move")]
    NoMove,
}

/// Strength controls the engine advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub limit_strength: bool,
    pub rating_target: bool,
    pub skill_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOption {
    LimitStrength(bool),
    RatingTarget(i32),
    SkillLevel(i32),
    MultiPv(usize),
}

impl EngineOption {
    /// UCI option name.
    pub fn name(&self) -> &'static str {
        match self {
            EngineOption::LimitStrength(_) => "UCI_LimitStrength",
            EngineOption::RatingTarget(_) => "UCI_Elo",
            EngineOption::SkillLevel(_) => "Skill Level",
            EngineOption::MultiPv(_) => "MultiPV",
        }
    }

    pub fn value(&self) -> String {
        match self {
            EngineOption::LimitStrength(enabled) => enabled.to_string(),
            EngineOption::RatingTarget(rating) => rating.to_string(),
            EngineOption::SkillLevel(level) => level.to_string(),
            EngineOption::MultiPv(lines) => lines.to_string(),
        }
    }
}

/// Engine score, from the point of view of the side to move in the analysed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in `n` moves; `n <= 0` means the side to move is getting mated.
    Mate(i32),
}

impl Score {
    /// Collapses mate scores onto a large constant so every score is a number.
    pub fn centipawns(self, mate_value: i32) -> i32 {
        match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(moves) if moves > 0 => mate_value - moves,
            Score::Mate(moves) => -mate_value - moves,
        }
    }

    /// Centipawns from the fixed point of view of `pov`.
    pub fn relative_to(self, side_to_move: Color, pov: Color, mate_value: i32) -> i32 {
        let cp = self.centipawns(mate_value);
        if side_to_move == pov {
            cp
        } else {
            -cp
        }
    }
}

/// One principal line of an analysis. Either half may be missing when the
/// engine did not report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisLine {
    pub best_move: Option<Move>,
    pub score: Option<Score>,
}

pub trait SearchEngine {
    fn capabilities(&self) -> Capabilities;

    fn configure(&mut self, options: &[EngineOption]) -> Result<(), EngineError>;

    /// Analyses `position` for `budget`, returning up to `lines` principal lines, best first.
    fn analyze(
        &mut self,
        position: &Chess,
        budget: Duration,
        lines: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError>;

    fn play(&mut self, position: &Chess, budget: Duration) -> Result<Move, EngineError>;
}
