//! Play command - play an adaptive game against a UCI engine.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use adaptive_chess::engine::{EngineSession, UciEngine};
use adaptive_chess::game::commentary::{
    CommentaryBackend, CommentaryChannel, DisabledBackend, OllamaBackend, OllamaSettings,
    DEFAULT_MODEL, DEFAULT_URL,
};
use adaptive_chess::game::{ControllerConfig, TurnController};
use adaptive_chess::rating::load_profile_or_default;
use adaptive_chess::tui::TuiApp;
use log::{info, warn};
use structopt::StructOpt;

use super::util::{init_logging, ColorChoice, CommandError};
use super::Command;

#[derive(StructOpt)]
pub struct PlayArgs {
    /// Path to a UCI engine binary.
    #[structopt(long, default_value = "stockfish", parse(from_os_str))]
    pub engine: PathBuf,
    /// Player profile, read at startup and rewritten after every game.
    #[structopt(long, default_value = "player_profile.json", parse(from_os_str))]
    pub persist: PathBuf,
    /// Base engine think time in milliseconds.
    #[structopt(long = "time", default_value = "200")]
    pub think_time_ms: u64,
    /// Finished games are appended here, one JSON object per line.
    #[structopt(long, default_value = "game_history.jsonl", parse(from_os_str))]
    pub games_json: PathBuf,
    /// Rewrite this PGN file after every ply.
    #[structopt(long, parse(from_os_str))]
    pub live_pgn: Option<PathBuf>,
    #[structopt(short = "c", long = "color", alias = "human-color", default_value = "white")]
    pub color: ColorChoice,
    /// Overrides the name stored in the profile.
    #[structopt(long)]
    pub name: Option<String>,
    #[structopt(long)]
    pub no_commentary: bool,
    #[structopt(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    #[structopt(long, default_value = DEFAULT_URL)]
    pub ollama_url: String,
    /// Engine lines shown before each engine move.
    #[structopt(long, default_value = "3")]
    pub preview_lines: usize,
    #[structopt(long, default_value = "30")]
    pub fps: u32,
    /// Log output goes here instead of the terminal the board is drawn on.
    #[structopt(long, default_value = "adaptive_chess.log", parse(from_os_str))]
    pub log_file: PathBuf,
}

impl PlayArgs {
    fn commentary_backend(&self) -> Arc<dyn CommentaryBackend> {
        if self.no_commentary {
            return Arc::new(DisabledBackend);
        }
        let settings = OllamaSettings {
            model: self.model.clone(),
            url: self.ollama_url.clone(),
            ..OllamaSettings::default()
        };
        match OllamaBackend::new(settings) {
            Ok(backend) => Arc::new(backend),
            Err(error) => {
                warn!("commentary disabled: {}", error);
                Arc::new(DisabledBackend)
            }
        }
    }

    fn run(self) -> Result<(), CommandError> {
        let mut profile = load_profile_or_default(&self.persist);
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        info!(
            "starting {} at target strength {}",
            profile.name, profile.target_strength
        );

        let engine = UciEngine::spawn(&self.engine)?;
        let session = EngineSession::new(Box::new(engine), self.think_time_ms);
        let commentary = CommentaryChannel::new(self.commentary_backend());
        let config = ControllerConfig {
            profile_path: Some(self.persist),
            games_json: Some(self.games_json),
            live_pgn: self.live_pgn,
            preview_lines: self.preview_lines,
        };
        let mut controller =
            TurnController::new(profile, session, commentary, config, self.color.0);

        let mut app = TuiApp::new()?;
        app.run(&mut controller, self.fps)?;
        Ok(())
    }
}

impl Command for PlayArgs {
    fn execute(self) {
        init_logging(Some(&self.log_file));
        if let Err(error) = self.run() {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    }
}
