//! Typed board input for the terminal front-end.

pub mod input;

pub use input::{InputError, InputLine, UserInput};
