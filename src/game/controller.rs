//! Turn controller: sequences one human-vs-engine game a tick at a time.
//!
//! Each tick first folds in any commentary that has arrived, then performs at
//! most one state-advancing action. The engine always spends one tick on its
//! preview before it moves, so the previewed lines get at least one frame on
//! screen.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use shakmaty::{Color, Move, Position, Square};

use crate::engine::EngineSession;
use crate::evaluation::MoveEvaluator;
use crate::rating::{save_profile, RatingProfile, DRAW, LOSS, WIN};
use crate::rules::GameEnding;

use super::commentary::{CommentaryChannel, CommentaryReply, CommentaryRequest};
use super::record::{
    append_game_record, build_pgn, write_live_pgn, GameRecord, PgnTags, UNFINISHED,
};
use super::state::{Phase, TurnState};

pub const DEFAULT_PREVIEW_LINES: usize = 3;
const ENGINE_NAME: &str = "Engine";
/// How long a finished game's record waits for commentary still in flight.
/// Longer than one commentary request may take.
const EXPORT_GRACE: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Where the profile is saved after every settled game.
    pub profile_path: Option<PathBuf>,
    /// Append-only history of finished games.
    pub games_json: Option<PathBuf>,
    /// Overwritten with the game so far after every ply.
    pub live_pgn: Option<PathBuf>,
    pub preview_lines: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            profile_path: None,
            games_json: None,
            live_pgn: None,
            preview_lines: DEFAULT_PREVIEW_LINES,
        }
    }
}

pub struct TurnController {
    state: TurnState,
    profile: RatingProfile,
    session: EngineSession,
    evaluator: MoveEvaluator,
    commentary: CommentaryChannel,
    config: ControllerConfig,
    /// Settled game whose record is not written yet, with its deadline.
    pending_export: Option<(GameEnding, Instant)>,
}

impl TurnController {
    pub fn new(
        profile: RatingProfile,
        mut session: EngineSession,
        commentary: CommentaryChannel,
        config: ControllerConfig,
        human_color: Color,
    ) -> Self {
        session.apply_strength(&profile);
        info!(
            "new game: human plays {:?} at target strength {}",
            human_color, profile.target_strength
        );
        Self {
            state: TurnState::new(human_color, 0),
            profile,
            session,
            evaluator: MoveEvaluator::new(),
            commentary,
            config,
            pending_export: None,
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn profile(&self) -> &RatingProfile {
        &self.profile
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// One frame's worth of work.
    pub fn tick(&mut self) {
        self.drain_commentary();
        match self.phase() {
            Phase::AwaitingHuman => {}
            Phase::AiPreviewPending => self.request_preview(),
            Phase::AiToMove => self.play_engine_move(),
            Phase::GameOver => {
                self.settle();
                self.flush_export(false);
            }
        }
    }

    /// A click on `square`: selects one of the human's pieces, or completes
    /// a move from the current selection. Anything else clears the selection.
    /// Ignored unless the human is to move.
    pub fn click(&mut self, square: Square) {
        if self.phase() != Phase::AwaitingHuman {
            return;
        }

        let from = match self.state.selection {
            Some(from) => from,
            None => {
                if self.state.game.piece_color_at(square) == Some(self.state.human_color) {
                    self.state.selection = Some(square);
                    self.state.legal_targets = self.state.game.legal_targets(square);
                }
                return;
            }
        };

        match self.state.game.find_move(from, square) {
            Some(m) => self.play_human_move(m),
            None => self.state.clear_selection(),
        }
    }

    /// A whole move typed at once. Any earlier selection is dropped first so
    /// the move does not complete against it.
    pub fn submit_move(&mut self, from: Square, to: Square) {
        if self.phase() != Phase::AwaitingHuman {
            return;
        }
        self.state.clear_selection();
        self.click(from);
        self.click(to);
    }

    /// Starts a fresh game, keeping the profile and the evaluator's history.
    pub fn reset(&mut self, human_color: Color) {
        self.flush_export(true);
        let generation = self.state.generation + 1;
        self.state = TurnState::new(human_color, generation);
        self.session.apply_strength(&self.profile);
        info!(
            "new game: human plays {:?} at target strength {}",
            human_color, self.profile.target_strength
        );
    }

    /// Records the outcome once the board reaches a terminal position. Later
    /// calls for the same game do nothing. The game record is written once
    /// every human move's commentary has landed, or after a grace period;
    /// commentary still missing then is recorded as `null`.
    pub fn settle(&mut self) {
        if self.state.result.is_some() {
            return;
        }
        let ending = match self.state.game.ending() {
            Some(ending) => ending,
            None => return,
        };

        let score = match ending.winner() {
            None => DRAW,
            Some(winner) if winner == self.state.human_color => WIN,
            Some(_) => LOSS,
        };
        self.profile.record_outcome(score);
        self.profile.adapt_from_outcomes();
        if let Some(path) = &self.config.profile_path {
            if let Err(error) = save_profile(&self.profile, path) {
                warn!("failed to save profile to {}: {}", path.display(), error);
            }
        }
        self.session.apply_strength(&self.profile);

        self.state.result = Some(score);
        self.state.ending = Some(ending);
        self.state.clear_selection();
        self.state.pending_previews = None;
        info!(
            "game over: {} ({}), human scored {}, target strength now {}",
            ending.describe(),
            ending.result_str(),
            score,
            self.profile.target_strength
        );

        self.pending_export = Some((ending, Instant::now() + EXPORT_GRACE));
        self.flush_export(false);
    }

    /// Folds in every commentary reply that has arrived.
    pub fn drain_commentary(&mut self) {
        for reply in self.commentary.drain() {
            self.apply_commentary(reply);
        }
    }

    /// Stores a reply in the slot reserved for it. Replies from an earlier
    /// game are dropped.
    pub fn apply_commentary(&mut self, reply: CommentaryReply) {
        if reply.generation != self.state.generation {
            debug!(
                "dropping commentary for ply {} of an earlier game",
                reply.slot
            );
            return;
        }
        match self.state.commentary_by_ply.get_mut(reply.slot) {
            Some(slot) => *slot = Some(reply.text.clone()),
            None => {
                warn!("commentary for unknown ply {}", reply.slot);
                return;
            }
        }
        self.state.latest_commentary = Some(reply.text);
    }

    fn play_human_move(&mut self, m: Move) {
        let fen = self.state.game.fen();
        let san = self.state.game.san(m);
        let delta = self
            .evaluator
            .score(&mut self.session, &self.state.game, m, self.state.human_color);
        self.state.last_move_delta = delta;

        match delta {
            Some(delta) => {
                self.profile.adjust_midgame(Some(delta));
                self.session.apply_strength(&self.profile);
                info!(
                    "human {} delta {:+} target strength {}",
                    san, delta, self.profile.target_strength
                );
            }
            None => info!(
                "human {} (no evaluation) target strength {}",
                san, self.profile.target_strength
            ),
        }

        if let Err(error) = self.state.game.apply(m) {
            warn!("could not apply human move {}: {}", san, error);
            self.state.clear_selection();
            return;
        }
        let slot = self.state.push_ply(m, san.clone());
        self.state.clear_selection();
        self.state.pending_previews = None;

        self.commentary.dispatch(CommentaryRequest {
            generation: self.state.generation,
            slot,
            fen,
            san,
            delta,
        });
        self.write_live_pgn();
    }

    fn request_preview(&mut self) {
        let previews = self.evaluator.preview(
            &mut self.session,
            &self.state.game,
            self.profile.target_strength,
            self.config.preview_lines,
        );
        self.state.pending_previews = Some(previews);
    }

    fn play_engine_move(&mut self) {
        let m = match self.choose_engine_move() {
            Some(m) => m,
            None => return,
        };
        let san = self.state.game.san(m);
        if let Err(error) = self.state.game.apply(m) {
            warn!("could not apply engine move {}: {}", san, error);
            return;
        }

        let hint = self
            .state
            .pending_previews
            .take()
            .and_then(|previews| previews.into_iter().find(|(p, _)| *p == m))
            .map(|(_, cp)| cp);
        self.state.last_engine_hint = hint;
        match hint {
            Some(cp) => info!(
                "engine {} at target strength {} (cp {:+})",
                san, self.profile.target_strength, cp
            ),
            None => info!(
                "engine {} at target strength {}",
                san, self.profile.target_strength
            ),
        }

        self.state.push_ply(m, san);
        self.write_live_pgn();
    }

    /// The engine's move, or the first legal move when the engine fails.
    fn choose_engine_move(&mut self) -> Option<Move> {
        let position = self.state.game.position().clone();
        match self
            .session
            .choose_move(&position, self.profile.target_strength)
        {
            Ok(m) if self.state.game.is_legal(m) => return Some(m),
            Ok(_) => warn!("engine chose an illegal move; playing the first legal move"),
            Err(error) => warn!("engine failed to move ({}); playing the first legal move", error),
        }
        position.legal_moves().first().cloned()
    }

    fn player_names(&self) -> (&str, &str) {
        let human = self.profile.name.as_str();
        match self.state.human_color {
            Color::White => (human, ENGINE_NAME),
            Color::Black => (ENGINE_NAME, human),
        }
    }

    fn pgn(&self, result: &str) -> String {
        let (white, black) = self.player_names();
        build_pgn(
            &PgnTags::today(white, black, result),
            &self.state.notation_history,
        )
    }

    fn write_live_pgn(&self) {
        let path = match &self.config.live_pgn {
            Some(path) => path,
            None => return,
        };
        let result = self
            .state
            .game
            .ending()
            .map_or(UNFINISHED, |ending| ending.result_str());
        if let Err(error) = write_live_pgn(path, &self.pgn(result)) {
            warn!("failed to write live PGN to {}: {}", path.display(), error);
        }
    }

    /// Writes the pending record once its commentary is complete, its grace
    /// period is over, or `force` is set.
    fn flush_export(&mut self, force: bool) {
        let (ending, deadline) = match self.pending_export {
            Some(pending) => pending,
            None => return,
        };
        self.drain_commentary();
        if !force && !self.human_commentary_complete() && Instant::now() < deadline {
            return;
        }
        self.pending_export = None;
        self.export_record(ending);
    }

    fn human_commentary_complete(&self) -> bool {
        // White made the even plies
        let human_parity = match self.state.human_color {
            Color::White => 0,
            Color::Black => 1,
        };
        self.state
            .commentary_by_ply
            .iter()
            .enumerate()
            .all(|(ply, text)| ply % 2 != human_parity || text.is_some())
    }

    fn export_record(&self, ending: GameEnding) {
        let path = match &self.config.games_json {
            Some(path) => path,
            None => return,
        };
        let record = GameRecord::new(
            ending.result_str(),
            ending.winner(),
            self.state.human_color,
            self.profile.target_strength,
            self.state.notation_history.clone(),
            self.state.commentary_by_ply.clone(),
            self.pgn(ending.result_str()),
        );
        match append_game_record(path, &record) {
            Ok(()) => info!("saved game record to {}", path.display()),
            Err(error) => warn!("failed to save game record to {}: {}", path.display(), error),
        }
    }
}

impl Drop for TurnController {
    fn drop(&mut self) {
        self.flush_export(true);
    }
}
