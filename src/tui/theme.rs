//! Color theme for the TUI
//!
//! Colors can be configured via a `tui_colors.toml` file in the current working directory.
//! The four board colors are required; highlight colors are optional. If the file doesn't
//! exist or is invalid, default colors are used.
//!
//! Example `tui_colors.toml`:
//! ```toml
//! light_square = 200, 180, 150  # Medium-light beige
//! dark_square = 120, 90, 60      # Medium-dark brown
//! piece_white = 255, 255, 255    # Very light - visible on dark squares
//! piece_black = 30, 30, 30       # Very dark - visible on light squares
//! selection = 220, 200, 60       # Optional
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ratatui::style::{Color, Modifier, Style};

pub const THEME_FILE: &str = "tui_colors.toml";

/// Why a square is drawn highlighted. Earlier variants win when several apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareMark {
    Selected,
    Target,
    Preview,
    LastMove,
}

/// Color theme for the chess TUI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub light_square: Color,
    pub dark_square: Color,
    pub piece_white: Color,
    pub piece_black: Color,
    pub selection: Color,
    pub target: Color,
    pub preview: Color,
    pub last_move: Color,
    pub border: Color,
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(Path::new(THEME_FILE)).unwrap_or_else(Self::builtin)
    }
}

impl Theme {
    /// Built-in colors, ignoring any theme file.
    pub fn builtin() -> Self {
        Self {
            light_square: Color::Rgb(200, 180, 150),
            dark_square: Color::Rgb(120, 90, 60),
            piece_white: Color::Rgb(255, 255, 255),
            piece_black: Color::Rgb(30, 30, 30),
            selection: Color::Rgb(220, 200, 60),
            target: Color::Rgb(110, 170, 90),
            preview: Color::Rgb(90, 140, 200),
            last_move: Color::Rgb(170, 150, 100),
            border: Color::Gray,
            text: Color::White,
        }
    }

    fn load(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        Self::parse(&contents)
    }

    /// Parses the `key = r, g, b` format. Returns None unless all four board
    /// colors are present.
    fn parse(contents: &str) -> Option<Self> {
        let mut colors = HashMap::new();

        for line in contents.lines() {
            // strip trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let rgb_str = value.trim().trim_start_matches('[').trim_end_matches(']');
                let rgb_parts: Vec<&str> = rgb_str.split(',').map(|s| s.trim()).collect();
                if rgb_parts.len() == 3 {
                    if let (Ok(r), Ok(g), Ok(b)) = (
                        rgb_parts[0].parse::<u8>(),
                        rgb_parts[1].parse::<u8>(),
                        rgb_parts[2].parse::<u8>(),
                    ) {
                        colors.insert(key.trim().to_string(), Color::Rgb(r, g, b));
                    }
                }
            }
        }

        let builtin = Self::builtin();
        let optional = |key: &str, fallback: Color| colors.get(key).copied().unwrap_or(fallback);
        Some(Self {
            light_square: *colors.get("light_square")?,
            dark_square: *colors.get("dark_square")?,
            piece_white: *colors.get("piece_white")?,
            piece_black: *colors.get("piece_black")?,
            selection: optional("selection", builtin.selection),
            target: optional("target", builtin.target),
            preview: optional("preview", builtin.preview),
            last_move: optional("last_move", builtin.last_move),
            border: builtin.border,
            text: builtin.text,
        })
    }

    /// Get style for a square with an optional piece and highlight
    pub fn square_style(
        &self,
        is_light_square: bool,
        piece_color: Option<shakmaty::Color>,
        mark: Option<SquareMark>,
    ) -> Style {
        let square_bg = match mark {
            Some(SquareMark::Selected) => self.selection,
            Some(SquareMark::Target) => self.target,
            Some(SquareMark::Preview) => self.preview,
            Some(SquareMark::LastMove) => self.last_move,
            None if is_light_square => self.light_square,
            None => self.dark_square,
        };

        let style = Style::default().bg(square_bg);
        match piece_color {
            Some(shakmaty::Color::White) => style.fg(self.piece_white).add_modifier(Modifier::BOLD),
            Some(shakmaty::Color::Black) => style.fg(self.piece_black).add_modifier(Modifier::BOLD),
            None => style,
        }
    }

    /// Get style for text
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }
}
