//! One human-vs-engine game: the turn controller and its per-game state,
//! commentary on human moves, and the exported game record.

pub mod commentary;
pub mod controller;
pub mod record;
pub mod state;

pub use controller::{ControllerConfig, TurnController};
pub use state::{Phase, TurnState};
