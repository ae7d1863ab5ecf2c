mod cli;

use cli::commands::Command;
use structopt::StructOpt;

fn main() {
    cli::AdaptiveChess::from_args().execute();
}
