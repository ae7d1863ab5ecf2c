//! Shared utilities for commands.

use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use adaptive_chess::engine::EngineError;
use shakmaty::Color;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum CommandError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Human side chosen on the command line.
#[derive(Debug, Clone, Copy)]
pub struct ColorChoice(pub Color);

// used for parsing cli args
impl FromStr for ColorChoice {
    type Err = &'static str;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "white" => Ok(ColorChoice(Color::White)),
            "black" => Ok(ColorChoice(Color::Black)),
            "random" => Ok(ColorChoice(if rand::random::<bool>() {
                Color::White
            } else {
                Color::Black
            })),
            _ => Err("invalid color; options are: black, white, random"),
        }
    }
}

/// Logs at `info` unless `RUST_LOG` says otherwise. With a log file the
/// output goes there so it cannot tear the terminal UI.
pub(crate) fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(error) => eprintln!("cannot open log file {}: {}", path.display(), error),
        }
    }
    let _ = builder.try_init();
}
