//! CLI command implementations.

pub trait Command {
    fn execute(self);
}

pub mod play;
pub mod profile;

// Shared utilities for commands
pub(crate) mod util;
