//! Profile command - show the stored player profile.

use std::path::PathBuf;
use std::process;

use adaptive_chess::engine::{
    skill_level_for, strength_setting, Capabilities, SearchEngine, UciEngine,
};
use adaptive_chess::rating::{load_profile, RatingProfile};
use structopt::StructOpt;

use super::util::init_logging;
use super::Command;

#[derive(StructOpt)]
pub struct ProfileArgs {
    #[structopt(long, default_value = "player_profile.json", parse(from_os_str))]
    pub persist: PathBuf,
    /// Also ask this UCI engine which strength control it offers.
    #[structopt(long, parse(from_os_str))]
    pub engine: Option<PathBuf>,
}

fn print_profile(profile: &RatingProfile) {
    let outcomes: Vec<String> = profile
        .recent_outcomes
        .iter()
        .map(|o| format!("{:.1}", o))
        .collect();
    println!("name:            {}", profile.name);
    println!("target strength: {}", profile.target_strength);
    println!(
        "recent results:  [{}] (window {})",
        outcomes.join(", "),
        profile.window
    );
    println!(
        "gains:           outcome {}, midgame {}",
        profile.outcome_gain, profile.midgame_gain
    );
    println!(
        "bounds:          {}..={}",
        profile.strength_min, profile.strength_max
    );
}

impl Command for ProfileArgs {
    fn execute(self) {
        init_logging(None);
        let profile = match load_profile(&self.persist) {
            Ok(profile) => profile,
            Err(error) => {
                eprintln!("error: {}", error);
                process::exit(1);
            }
        };
        print_profile(&profile);

        let target = profile.target_strength;
        let full = Capabilities {
            limit_strength: true,
            rating_target: true,
            skill_level: true,
        };
        println!();
        println!("rating engines:  {:?}", strength_setting(full, target));
        println!("skill engines:   skill level {}", skill_level_for(target));

        if let Some(path) = self.engine {
            match UciEngine::spawn(&path) {
                Ok(engine) => println!(
                    "{}: {:?}",
                    path.display(),
                    strength_setting(engine.capabilities(), target)
                ),
                Err(error) => eprintln!("error: {}", error),
            }
        }
    }
}
