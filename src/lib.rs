pub mod engine;
pub mod evaluation;
pub mod game;
pub mod input_handler;
pub mod rating;
pub mod rules;
pub mod tui;
