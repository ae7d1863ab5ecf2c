//! Board input parsing.
//!
//! The terminal has no mouse board, so squares are typed: a single square is
//! one click, a coordinate move such as `e2e4` is a whole move that replaces
//! any square already selected.

use std::str::FromStr;

use crossterm::event::KeyCode;
use once_cell::sync::Lazy;
use regex::Regex;
use shakmaty::Square;
use thiserror::Error;

static SQUARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^([a-h][1-8])$").expect("SQUARE_RE regex should be valid"));
static COORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("^([a-h][1-8])([a-h][1-8])q?$").expect("COORD_RE regex should be valid")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid input: {input:?}")]
    InvalidInput { input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    Click(Square),
    Move { from: Square, to: Square },
    Reset,
    SwapColors,
    Quit,
}

fn parse_square(text: &str) -> Result<Square, InputError> {
    text.parse().map_err(|_| InputError::InvalidInput {
        input: text.to_string(),
    })
}

impl FromStr for UserInput {
    type Err = InputError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim().to_lowercase();

        match trimmed.as_str() {
            ":r" => return Ok(UserInput::Reset),
            ":c" => return Ok(UserInput::SwapColors),
            ":q" => return Ok(UserInput::Quit),
            _ => (),
        }

        if let Some(caps) = SQUARE_RE.captures(&trimmed) {
            return Ok(UserInput::Click(parse_square(&caps[1])?));
        }

        if let Some(caps) = COORD_RE.captures(&trimmed) {
            return Ok(UserInput::Move {
                from: parse_square(&caps[1])?,
                to: parse_square(&caps[2])?,
            });
        }

        Err(InputError::InvalidInput {
            input: input.to_string(),
        })
    }
}

/// The line being typed into the input box.
#[derive(Debug, Default)]
pub struct InputLine {
    buffer: String,
}

impl InputLine {
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Feeds one key press. Returns the parsed input when a line is submitted
    /// or the user presses Esc.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<Result<UserInput, InputError>> {
        match code {
            KeyCode::Enter => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.buffer);
                Some(line.parse())
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                None
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                None
            }
            KeyCode::Esc => Some(Ok(UserInput::Quit)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_square_is_one_click() {
        let input: UserInput = "e2".parse().unwrap();
        assert_eq!(input, UserInput::Click(Square::E2));
    }

    #[test]
    fn test_parse_coordinate_move() {
        let input: UserInput = " E2E4 ".parse().unwrap();
        assert_eq!(
            input,
            UserInput::Move {
                from: Square::E2,
                to: Square::E4
            }
        );

        let promotion: UserInput = "a7a8q".parse().unwrap();
        assert_eq!(
            promotion,
            UserInput::Move {
                from: Square::A7,
                to: Square::A8
            }
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(":r".parse::<UserInput>(), Ok(UserInput::Reset));
        assert_eq!(":c".parse::<UserInput>(), Ok(UserInput::SwapColors));
        assert_eq!(":q".parse::<UserInput>(), Ok(UserInput::Quit));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "Nf3".parse::<UserInput>(),
            Err(InputError::InvalidInput {
                input: "Nf3".to_string()
            })
        );
        assert!("i9".parse::<UserInput>().is_err());
        assert!("e2e4e5".parse::<UserInput>().is_err());
    }

    #[test]
    fn test_input_line_submits_on_enter() {
        let mut line = InputLine::default();
        for c in "e2e5".chars() {
            assert_eq!(line.handle_key(KeyCode::Char(c)), None);
        }
        line.handle_key(KeyCode::Backspace);
        line.handle_key(KeyCode::Char('4'));
        assert_eq!(line.as_str(), "e2e4");

        assert_eq!(
            line.handle_key(KeyCode::Enter),
            Some(Ok(UserInput::Move {
                from: Square::E2,
                to: Square::E4
            }))
        );
        assert_eq!(line.as_str(), "");
        assert_eq!(line.handle_key(KeyCode::Enter), None);
    }

    #[test]
    fn test_escape_quits() {
        let mut line = InputLine::default();
        assert_eq!(line.handle_key(KeyCode::Esc), Some(Ok(UserInput::Quit)));
    }
}
