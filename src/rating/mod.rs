//! Adaptive rating model.
//!
//! `RatingProfile` holds one player's estimate of the strength the engine
//! should play at. Finished games move it through a trailing window of
//! outcomes; individual scored moves nudge it immediately.

pub mod store;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub use store::{load_profile, load_profile_or_default, save_profile, StoreError};

/// Centipawns of swing per midgame step.
pub const MIDGAME_SENSITIVITY: i32 = 80;
/// Largest number of midgame steps a single move can earn or lose.
pub const MAX_MIDGAME_STEP: i32 = 2;

/// Outcome score of a finished game from the player's side.
pub const WIN: f64 = 1.0;
pub const DRAW: f64 = 0.5;
pub const LOSS: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingProfile {
    pub name: String,
    #[serde(alias = "target_elo")]
    pub target_strength: i32,
    #[serde(alias = "results")]
    pub recent_outcomes: VecDeque<f64>,
    pub window: usize,
    #[serde(alias = "k")]
    pub outcome_gain: i32,
    #[serde(alias = "midgame_k")]
    pub midgame_gain: i32,
    #[serde(alias = "elo_min")]
    pub strength_min: i32,
    #[serde(alias = "elo_max")]
    pub strength_max: i32,
}

impl Default for RatingProfile {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            target_strength: 900,
            recent_outcomes: VecDeque::new(),
            window: 8,
            outcome_gain: 50,
            midgame_gain: 10,
            strength_min: 400,
            strength_max: 3200,
        }
    }
}

impl RatingProfile {
    /// Appends a finished game's score, dropping the oldest entries beyond the window.
    pub fn record_outcome(&mut self, score: f64) {
        self.recent_outcomes.push_back(score);
        while self.recent_outcomes.len() > self.window {
            self.recent_outcomes.pop_front();
        }
    }

    /// Moves the target by the window's mean performance, anchored on the
    /// current target rather than recomputed from history. A change of exactly
    /// half a point rounds to even.
    pub fn adapt_from_outcomes(&mut self) {
        if self.recent_outcomes.is_empty() {
            return;
        }

        let mean = self.recent_outcomes.iter().sum::<f64>() / self.recent_outcomes.len() as f64;
        let performance = mean - 0.5;
        let change = (f64::from(self.outcome_gain) * performance).round_ties_even() as i32;
        self.target_strength = self.clamp(self.target_strength + change);
    }

    /// Nudges the target from one move's centipawn swing. `None` and swings
    /// under one sensitivity step leave the target untouched.
    pub fn adjust_midgame(&mut self, delta_centipawns: Option<i32>) {
        let delta = match delta_centipawns {
            Some(delta) => delta,
            None => return,
        };

        let step = (delta / MIDGAME_SENSITIVITY).clamp(-MAX_MIDGAME_STEP, MAX_MIDGAME_STEP);
        if step == 0 {
            return;
        }

        self.target_strength = self.clamp(self.target_strength + step * self.midgame_gain);
    }

    /// Repairs a profile read from disk so the invariants hold again.
    pub fn normalize(&mut self) {
        self.window = self.window.max(1);
        if self.strength_min > self.strength_max {
            std::mem::swap(&mut self.strength_min, &mut self.strength_max);
        }
        self.target_strength = self.clamp(self.target_strength);
        while self.recent_outcomes.len() > self.window {
            self.recent_outcomes.pop_front();
        }
    }

    fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.strength_min, self.strength_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RatingProfile {
        RatingProfile {
            window: 3,
            outcome_gain: 50,
            target_strength: 1500,
            strength_min: 800,
            strength_max: 2400,
            ..RatingProfile::default()
        }
    }

    #[test]
    fn test_three_wins_raise_target_by_half_gain() {
        let mut profile = profile();
        for _ in 0..3 {
            profile.record_outcome(WIN);
        }
        profile.adapt_from_outcomes();
        assert_eq!(profile.target_strength, 1525);
    }

    #[test]
    fn test_three_losses_lower_target_by_half_gain() {
        let mut profile = profile();
        for _ in 0..3 {
            profile.record_outcome(LOSS);
        }
        profile.adapt_from_outcomes();
        assert_eq!(profile.target_strength, 1475);
    }

    #[test]
    fn test_half_point_change_rounds_to_even() {
        let mut profile = RatingProfile {
            target_strength: 1500,
            ..RatingProfile::default()
        };
        for score in [WIN, WIN, WIN, LOSS, WIN, WIN, WIN, LOSS] {
            profile.record_outcome(score);
        }
        // 50 * (0.75 - 0.5) = 12.5
        profile.adapt_from_outcomes();
        assert_eq!(profile.target_strength, 1512);
    }

    #[test]
    fn test_adapt_with_empty_window_is_noop() {
        let mut profile = profile();
        profile.adapt_from_outcomes();
        assert_eq!(profile.target_strength, 1500);
    }

    #[test]
    fn test_adapt_compounds_from_current_target() {
        let mut profile = profile();
        profile.record_outcome(WIN);
        profile.adapt_from_outcomes();
        profile.adapt_from_outcomes();
        assert_eq!(profile.target_strength, 1550);
    }

    #[test]
    fn test_record_outcome_keeps_newest_entries_in_order() {
        let mut profile = profile();
        for score in [WIN, DRAW, LOSS, WIN, DRAW] {
            profile.record_outcome(score);
            assert!(profile.recent_outcomes.len() <= profile.window);
        }
        assert_eq!(
            profile.recent_outcomes.iter().copied().collect::<Vec<_>>(),
            vec![LOSS, WIN, DRAW]
        );
    }

    #[test]
    fn test_adapt_stays_within_bounds() {
        let mut profile = RatingProfile {
            target_strength: 2390,
            ..profile()
        };
        for _ in 0..10 {
            profile.record_outcome(WIN);
            profile.adapt_from_outcomes();
            assert!(profile.target_strength <= profile.strength_max);
        }
        assert_eq!(profile.target_strength, 2400);

        for _ in 0..200 {
            profile.record_outcome(LOSS);
            profile.adapt_from_outcomes();
            assert!(profile.target_strength >= profile.strength_min);
        }
        assert_eq!(profile.target_strength, 800);
    }

    #[test]
    fn test_midgame_large_swing_moves_two_steps() {
        let mut profile = profile();
        profile.adjust_midgame(Some(200));
        assert_eq!(profile.target_strength, 1520);

        profile.adjust_midgame(Some(-5000));
        assert_eq!(profile.target_strength, 1500);
    }

    #[test]
    fn test_midgame_small_swing_and_none_are_noops() {
        let mut profile = profile();
        profile.adjust_midgame(None);
        profile.adjust_midgame(Some(79));
        profile.adjust_midgame(Some(-79));
        assert_eq!(profile.target_strength, 1500);
    }

    #[test]
    fn test_midgame_truncates_toward_zero() {
        let mut profile = profile();
        profile.adjust_midgame(Some(-159));
        assert_eq!(profile.target_strength, 1490);
    }

    #[test]
    fn test_normalize_repairs_loaded_values() {
        let mut profile = RatingProfile {
            window: 0,
            strength_min: 2000,
            strength_max: 1000,
            target_strength: 5000,
            recent_outcomes: VecDeque::from(vec![WIN, LOSS]),
            ..RatingProfile::default()
        };
        profile.normalize();
        assert_eq!(profile.window, 1);
        assert_eq!((profile.strength_min, profile.strength_max), (1000, 2000));
        assert_eq!(profile.target_strength, 2000);
        assert_eq!(profile.recent_outcomes, VecDeque::from(vec![LOSS]));
    }
}
