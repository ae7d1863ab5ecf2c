//! Engine session: strength control and move choice on top of a [`SearchEngine`].

use std::time::Duration;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shakmaty::{Chess, Move};

use crate::rating::RatingProfile;

use super::{Capabilities, EngineError, EngineOption, SearchEngine};

/// Lowest rating many engines accept for `UCI_Elo`.
pub const RATING_FLOOR: i32 = 1320;
/// Rating span mapped linearly onto the skill knob.
pub const SKILL_RATING_LOW: i32 = 400;
pub const SKILL_RATING_HIGH: i32 = 3200;
pub const MAX_SKILL_LEVEL: i32 = 20;

/// Probability of playing the top line when weakening below the rating floor.
const TOP_LINE_PROBABILITY: f64 = 0.7;
const MIN_THINK_TIME: Duration = Duration::from_millis(50);
const THINK_JITTER_SECS: f64 = 0.1;

/// Engine configuration a target strength maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthSetting {
    Rating(i32),
    SkillLevel(i32),
    Unavailable,
}

impl StrengthSetting {
    pub fn options(&self) -> Vec<EngineOption> {
        match *self {
            StrengthSetting::Rating(rating) => vec![
                EngineOption::LimitStrength(true),
                EngineOption::RatingTarget(rating),
            ],
            StrengthSetting::SkillLevel(level) => vec![EngineOption::SkillLevel(level)],
            StrengthSetting::Unavailable => Vec::new(),
        }
    }
}

/// Linear map of 400..=3200 onto skill 0..=20; halves round to even.
pub fn skill_level_for(target_strength: i32) -> i32 {
    let span = f64::from(SKILL_RATING_HIGH - SKILL_RATING_LOW);
    let fraction = f64::from(target_strength - SKILL_RATING_LOW) / span;
    let skill = (fraction * f64::from(MAX_SKILL_LEVEL)).round_ties_even() as i32;
    skill.clamp(0, MAX_SKILL_LEVEL)
}

/// Maps a target strength onto whatever strength control the engine offers.
pub fn strength_setting(capabilities: Capabilities, target_strength: i32) -> StrengthSetting {
    if capabilities.limit_strength && capabilities.rating_target {
        StrengthSetting::Rating(target_strength.max(RATING_FLOOR))
    } else if capabilities.skill_level {
        StrengthSetting::SkillLevel(skill_level_for(target_strength))
    } else {
        StrengthSetting::Unavailable
    }
}

pub struct EngineSession {
    engine: Box<dyn SearchEngine>,
    capabilities: Capabilities,
    think_time_ms: u64,
    applied: Option<StrengthSetting>,
    rng: StdRng,
}

impl EngineSession {
    pub fn new(engine: Box<dyn SearchEngine>, think_time_ms: u64) -> Self {
        Self::with_rng(engine, think_time_ms, StdRng::from_entropy())
    }

    pub fn with_rng(engine: Box<dyn SearchEngine>, think_time_ms: u64, rng: StdRng) -> Self {
        let capabilities = engine.capabilities();
        Self {
            engine,
            capabilities,
            think_time_ms,
            applied: None,
            rng,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn think_time_ms(&self) -> u64 {
        self.think_time_ms
    }

    /// Last configuration the engine accepted.
    pub fn applied_strength(&self) -> Option<StrengthSetting> {
        self.applied
    }

    pub fn engine_mut(&mut self) -> &mut dyn SearchEngine {
        self.engine.as_mut()
    }

    /// Reconfigures the engine for the profile's target strength. Failures
    /// leave the previous configuration in place.
    pub fn apply_strength(&mut self, profile: &RatingProfile) {
        let setting = strength_setting(self.capabilities, profile.target_strength);
        if setting == StrengthSetting::Unavailable {
            if self.applied != Some(StrengthSetting::Unavailable) {
                warn!("engine offers no strength control; playing at full strength");
                self.applied = Some(StrengthSetting::Unavailable);
            }
            return;
        }

        match self.engine.configure(&setting.options()) {
            Ok(()) => {
                if self.applied != Some(setting) {
                    info!(
                        "engine strength set to {:?} for target {}",
                        setting, profile.target_strength
                    );
                }
                self.applied = Some(setting);
            }
            Err(error) => warn!("failed to set engine strength {:?}: {}", setting, error),
        }
    }

    /// Budget for each of the two analyses behind one move score.
    pub fn evaluation_budget(&self) -> Duration {
        Duration::from_millis(self.think_time_ms.max(100))
    }

    /// Budget for the candidate-line preview shown before the engine moves.
    pub fn preview_budget(&self) -> Duration {
        let secs = (self.think_time_ms as f64 / 800.0).clamp(0.2, 0.8);
        Duration::from_secs_f64(secs)
    }

    /// Think time for one engine move: grows with the target, never below the session's base time.
    pub fn think_time_for(&mut self, target_strength: i32) -> Duration {
        let scaled = Duration::from_secs_f64((f64::from(target_strength) / 3200.0 * 1.5).max(0.0));
        let base = scaled
            .max(MIN_THINK_TIME)
            .max(Duration::from_millis(self.think_time_ms));
        base + Duration::from_secs_f64(self.rng.gen_range(0.0..THINK_JITTER_SECS))
    }

    /// Picks the engine's move. Below the rating floor the engine cannot be
    /// weakened further through its own options, so one of several top lines
    /// is chosen at random instead.
    pub fn choose_move(
        &mut self,
        position: &Chess,
        target_strength: i32,
    ) -> Result<Move, EngineError> {
        let think_time = self.think_time_for(target_strength);

        if target_strength < RATING_FLOOR {
            let lines = (2 + target_strength / 100).clamp(1, 5) as usize;
            match self.engine.analyze(position, think_time, lines) {
                Ok(analysis) => {
                    let candidates: Vec<Move> =
                        analysis.into_iter().filter_map(|line| line.best_move).collect();
                    if let Some(choice) = self.pick_weakened(&candidates) {
                        return Ok(choice);
                    }
                }
                Err(error) => warn!("multi-line analysis failed, falling back to play: {}", error),
            }
        }

        self.engine.play(position, think_time)
    }

    fn pick_weakened(&mut self, candidates: &[Move]) -> Option<Move> {
        let (best, rest) = candidates.split_first()?;
        if rest.is_empty() || self.rng.gen_bool(TOP_LINE_PROBABILITY) {
            return Some(*best);
        }
        rest.choose(&mut self.rng).copied()
    }
}
