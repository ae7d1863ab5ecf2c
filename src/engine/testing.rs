//! In-memory engine for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use shakmaty::{Chess, Color, Move, Position};

use crate::rules::{fen_of, move_from_uci};

use super::{AnalysisLine, Capabilities, EngineError, EngineOption, Score, SearchEngine};

/// One scripted analysis line: principal move as UCI text and its score.
pub(crate) type ScriptLine = (Option<&'static str>, Option<Score>);

#[derive(Default)]
pub(crate) struct Script {
    pub capabilities: Capabilities,
    pub analyses: VecDeque<Result<Vec<ScriptLine>, EngineError>>,
    pub plays: VecDeque<&'static str>,
    pub fail_configure: bool,
    pub configured: Vec<EngineOption>,
    /// FEN and side to move of every analysed position, in call order.
    pub analyzed: Vec<(String, Color)>,
    pub analyze_budgets: Vec<Duration>,
    pub play_budgets: Vec<Duration>,
}

/// Engine that replays queued answers. Once a queue runs dry, analysis
/// returns nothing and play falls back to the first legal move.
#[derive(Clone, Default)]
pub(crate) struct ScriptedEngine {
    pub script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let engine = Self::default();
        engine.script.borrow_mut().capabilities = capabilities;
        engine
    }

    pub fn push_analysis(&self, lines: Vec<ScriptLine>) {
        self.script.borrow_mut().analyses.push_back(Ok(lines));
    }

    /// Queues a single-line analysis scored in centipawns for the side to move.
    pub fn push_score(&self, cp: i32) {
        self.push_analysis(vec![(None, Some(Score::Centipawns(cp)))]);
    }

    pub fn push_failure(&self) {
        self.script
            .borrow_mut()
            .analyses
            .push_back(Err(EngineError::Timeout {
                waiting_for: "bestmove",
            }));
    }

    pub fn push_play(&self, uci: &'static str) {
        self.script.borrow_mut().plays.push_back(uci);
    }
}

impl SearchEngine for ScriptedEngine {
    fn capabilities(&self) -> Capabilities {
        self.script.borrow().capabilities
    }

    fn configure(&mut self, options: &[EngineOption]) -> Result<(), EngineError> {
        let mut script = self.script.borrow_mut();
        if script.fail_configure {
            return Err(EngineError::Closed);
        }
        script.configured.extend(options.iter().cloned());
        Ok(())
    }

    fn analyze(
        &mut self,
        position: &Chess,
        budget: Duration,
        lines: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        let mut script = self.script.borrow_mut();
        script.analyzed.push((fen_of(position), position.turn()));
        script.analyze_budgets.push(budget);
        let scripted = match script.analyses.pop_front() {
            Some(answer) => answer?,
            None => Vec::new(),
        };
        Ok(scripted
            .into_iter()
            .take(lines)
            .map(|(uci, score)| AnalysisLine {
                best_move: uci.and_then(|text| move_from_uci(position, text)),
                score,
            })
            .collect())
    }

    fn play(&mut self, position: &Chess, budget: Duration) -> Result<Move, EngineError> {
        let mut script = self.script.borrow_mut();
        script.play_budgets.push(budget);
        match script.plays.pop_front() {
            Some(text) => move_from_uci(position, text)
                .ok_or_else(|| EngineError::Protocol(format!("scripted move {} is illegal", text))),
            None => position
                .legal_moves()
                .into_iter()
                .next()
                .ok_or(EngineError::NoMove),
        }
    }
}
