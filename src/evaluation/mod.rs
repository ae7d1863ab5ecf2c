//! Scoring of individual moves with the external engine.
//!
//! A move is judged by comparing two analyses with the same side to move:
//! the position after the move, and the position before it with the turn
//! passed. Raw swings are then filtered for noise and smoothed against the
//! previous judgement so one shallow-search outlier cannot swing the rating.

use log::{debug, warn};
use shakmaty::{Chess, Color, Move, Position};

use crate::engine::{EngineSession, SearchEngine};
use crate::rules::Game;

/// Stand-in centipawn value for forced mates.
pub const MATE_VALUE: i32 = 100_000;
/// Swings larger than this are treated as search noise.
pub const NOISE_CLAMP: i32 = 800;
/// Plies counted as the opening.
pub const OPENING_PLIES: u32 = 14;
/// Opening swings below this are ignored as book noise.
pub const OPENING_NOISE: i32 = 40;
/// Weight of the newest delta in the moving average.
pub const SMOOTHING_WEIGHT: f64 = 0.7;

/// The position to compare a move against: the same position with the turn
/// passed, unless the side to move is in check and cannot pass.
pub fn tempo_neutral_before(position: &Chess) -> Chess {
    if position.is_check() {
        return position.clone();
    }
    match position.clone().swap_turn() {
        Ok(passed) => passed,
        Err(_) => position.clone(),
    }
}

/// Drops implausible swings and, during the opening, small ones.
pub fn filter_delta(raw_delta: i32, ply: u32) -> i32 {
    if raw_delta.abs() > NOISE_CLAMP {
        return 0;
    }
    if ply <= OPENING_PLIES && raw_delta.abs() < OPENING_NOISE {
        return 0;
    }
    raw_delta
}

/// Scores moves for one engine session. The smoothing state lives here, so
/// a fresh evaluator starts from a neutral history.
#[derive(Debug, Default)]
pub struct MoveEvaluator {
    previous_smoothed_delta: f64,
}

impl MoveEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_smoothed_delta(&self) -> f64 {
        self.previous_smoothed_delta
    }

    /// Centipawn swing of `m` for `mover`, or `None` when the engine could
    /// not score one of the two positions.
    pub fn score(
        &mut self,
        session: &mut EngineSession,
        game: &Game,
        m: Move,
        mover: Color,
    ) -> Option<i32> {
        if !game.is_legal(m) {
            warn!("refusing to score illegal move in {}", game.fen());
            return None;
        }

        let before = tempo_neutral_before(game.position());
        let mut after = game.position().clone();
        after.play_unchecked(m);

        let budget = session.evaluation_budget();
        let engine = session.engine_mut();
        let before_cp = score_for(engine, &before, budget, mover)?;
        let after_cp = score_for(engine, &after, budget, mover)?;

        let raw = after_cp - before_cp;
        let filtered = filter_delta(raw, game.ply());
        let smoothed = self.smooth(filtered);
        debug!(
            "move score: before {} after {} raw {} filtered {} smoothed {}",
            before_cp, after_cp, raw, filtered, smoothed
        );
        Some(smoothed)
    }

    /// Exponential moving average over successive deltas. Halves round to even.
    pub fn smooth(&mut self, delta: i32) -> i32 {
        let smoothed = SMOOTHING_WEIGHT * f64::from(delta)
            + (1.0 - SMOOTHING_WEIGHT) * self.previous_smoothed_delta;
        self.previous_smoothed_delta = smoothed;
        smoothed.round_ties_even() as i32
    }

    /// Candidate lines for the side to move, for display only.
    pub fn preview(
        &self,
        session: &mut EngineSession,
        game: &Game,
        target_strength: i32,
        count: usize,
    ) -> Vec<(Move, i32)> {
        let budget = session.preview_budget();
        let lines = match session.engine_mut().analyze(game.position(), budget, count) {
            Ok(lines) => lines,
            Err(error) => {
                warn!("failed to preview engine moves: {}", error);
                return Vec::new();
            }
        };

        let previews: Vec<(Move, i32)> = lines
            .into_iter()
            .filter_map(|line| match (line.best_move, line.score) {
                (Some(m), Some(score)) => Some((m, score.centipawns(MATE_VALUE))),
                _ => None,
            })
            .take(count)
            .collect();
        debug!(
            "previewed {} lines at target {}",
            previews.len(),
            target_strength
        );
        previews
    }
}

fn score_for(
    engine: &mut dyn SearchEngine,
    position: &Chess,
    budget: std::time::Duration,
    pov: Color,
) -> Option<i32> {
    match engine.analyze(position, budget, 1) {
        Ok(lines) => lines
            .into_iter()
            .find_map(|line| line.score)
            .map(|score| score.relative_to(position.turn(), pov, MATE_VALUE)),
        Err(error) => {
            warn!("move analysis failed: {}", error);
            None
        }
    }
}

#[cfg(test)]
mod tests;
