//! CLI argument parsing using StructOpt.

use structopt::StructOpt;

use crate::cli::commands::{play::PlayArgs, profile::ProfileArgs};

#[derive(StructOpt)]
#[structopt(
    name = "adaptive-chess",
    about = "Play chess against an engine that keeps adjusting its strength to yours ♛"
)]
pub enum AdaptiveChess {
    #[structopt(
        name = "play",
        about = "Play a game against a UCI engine (`--engine`, default: `stockfish`) whose strength follows your stored profile (`--persist`). Each of your moves is scored and, unless `--no-commentary` is given, commented on by a local Ollama model. Type a square and Enter to select it, or a whole move such as `e2e4`. `:r` restarts, `:c` swaps colors, `:q` or Esc quits."
    )]
    Play(PlayArgs),
    #[structopt(
        name = "profile",
        about = "Print the stored player profile (`--persist`) and the engine strength it maps to."
    )]
    Profile(ProfileArgs),
}

impl crate::cli::commands::Command for AdaptiveChess {
    fn execute(self) {
        macro_rules! execute_command {
            ($($variant:ident($cmd:ident)),+ $(,)?) => {
                match self {
                    $(Self::$variant($cmd) => $cmd.execute(),)+
                }
            };
        }

        execute_command! {
            Play(cmd),
            Profile(cmd),
        }
    }
}
