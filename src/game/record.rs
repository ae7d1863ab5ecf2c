//! Game record export: PGN text, the append-only JSON lines history, and the
//! live PGN file spectators can watch.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use shakmaty::Color;
use thiserror::Error;

const PGN_LINE_WIDTH: usize = 80;
/// Result token for a game still in progress.
pub const UNFINISHED: &str = "*";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to write game record: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode game record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tag values for the seven-tag roster. Event, site and round are fixed.
#[derive(Debug, Clone)]
pub struct PgnTags<'a> {
    pub white: &'a str,
    pub black: &'a str,
    pub date: String,
    pub result: &'a str,
}

impl<'a> PgnTags<'a> {
    /// Tags dated today.
    pub fn today(white: &'a str, black: &'a str, result: &'a str) -> Self {
        Self {
            white,
            black,
            date: Local::now().format("%Y.%m.%d").to_string(),
            result,
        }
    }
}

pub fn build_pgn(tags: &PgnTags, moves_san: &[String]) -> String {
    let mut pgn = String::new();
    for (name, value) in [
        ("Event", "Adaptive game"),
        ("Site", "?"),
        ("Date", tags.date.as_str()),
        ("Round", "?"),
        ("White", tags.white),
        ("Black", tags.black),
        ("Result", tags.result),
    ] {
        pgn.push_str(&format!("[{} \"{}\"]\n", name, value.replace('"', "'")));
    }
    pgn.push('\n');

    let mut tokens: Vec<String> = Vec::with_capacity(moves_san.len() * 3 / 2 + 1);
    for (index, san) in moves_san.iter().enumerate() {
        if index % 2 == 0 {
            tokens.push(format!("{}.", index / 2 + 1));
        }
        tokens.push(san.clone());
    }
    tokens.push(tags.result.to_string());

    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > PGN_LINE_WIDTH {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    pgn.push_str(&line);
    pgn.push('\n');
    pgn
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// One finished game as written to the history log.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub timestamp: String,
    pub result: String,
    pub winner: Option<&'static str>,
    pub winner_side: Option<&'static str>,
    pub final_target_strength: i32,
    pub moves_san: Vec<String>,
    pub commentary: Vec<Option<String>>,
    pub pgn: String,
}

impl GameRecord {
    pub fn new(
        result: &str,
        winner: Option<Color>,
        human_color: Color,
        final_target_strength: i32,
        moves_san: Vec<String>,
        commentary: Vec<Option<String>>,
        pgn: String,
    ) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            result: result.to_string(),
            winner: winner.map(color_name),
            winner_side: winner.map(|color| {
                if color == human_color {
                    "human"
                } else {
                    "engine"
                }
            }),
            final_target_strength,
            moves_san,
            commentary,
            pgn,
        }
    }
}

/// Appends `record` as one JSON line, creating the file if needed.
pub fn append_game_record(path: &Path, record: &GameRecord) -> Result<(), RecordError> {
    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

pub fn write_live_pgn(path: &Path, pgn: &str) -> Result<(), RecordError> {
    fs::write(path, pgn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("adaptive_chess_{}_{}", std::process::id(), name))
    }

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    fn tags<'a>(result: &'a str) -> PgnTags<'a> {
        PgnTags {
            white: "Engine",
            black: "ada",
            date: "2024.05.01".to_string(),
            result,
        }
    }

    #[test]
    fn test_pgn_has_roster_and_numbered_moves() {
        let pgn = build_pgn(&tags("0-1"), &sans(&["f3", "e5", "g4", "Qh4#"]));
        assert!(pgn.starts_with("[Event \"Adaptive game\"]\n"));
        assert!(pgn.contains("[Date \"2024.05.01\"]\n"));
        assert!(pgn.contains("[White \"Engine\"]\n[Black \"ada\"]\n[Result \"0-1\"]\n\n"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1\n"));
    }

    #[test]
    fn test_pgn_movetext_wraps() {
        let moves: Vec<String> = (0..60).map(|_| "Nf3".to_string()).collect();
        let pgn = build_pgn(&tags(UNFINISHED), &moves);
        let movetext = pgn.split("\n\n").nth(1).unwrap();
        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|line| line.len() <= 80));
        assert!(movetext.trim_end().ends_with('*'));
    }

    #[test]
    fn test_empty_game_is_just_result() {
        let pgn = build_pgn(&tags(UNFINISHED), &[]);
        assert!(pgn.ends_with("\n\n*\n"));
    }

    #[test]
    fn test_record_names_winner_side() {
        let record = GameRecord::new(
            "0-1",
            Some(Color::Black),
            Color::Black,
            1525,
            sans(&["f3", "e5"]),
            vec![None, Some("Good.".to_string())],
            String::new(),
        );
        assert_eq!(record.winner, Some("black"));
        assert_eq!(record.winner_side, Some("human"));

        let draw = GameRecord::new(
            "1/2-1/2",
            None,
            Color::White,
            900,
            Vec::new(),
            Vec::new(),
            String::new(),
        );
        assert_eq!(draw.winner, None);
        assert_eq!(draw.winner_side, None);
    }

    #[test]
    fn test_records_append_one_line_each() {
        let path = temp_path("records.jsonl");
        let _ = fs::remove_file(&path);

        let record = GameRecord::new(
            "1-0",
            Some(Color::White),
            Color::Black,
            875,
            sans(&["e4"]),
            vec![None],
            "pgn".to_string(),
        );
        append_game_record(&path, &record).unwrap();
        append_game_record(&path, &record).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["result"], "1-0");
        assert_eq!(parsed["winner"], "white");
        assert_eq!(parsed["winner_side"], "engine");
        assert_eq!(parsed["final_target_strength"], 875);
        assert_eq!(parsed["moves_san"][0], "e4");
        assert!(parsed["commentary"][0].is_null());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_live_pgn_overwrites() {
        let path = temp_path("live.pgn");
        write_live_pgn(&path, "first").unwrap();
        write_live_pgn(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        fs::remove_file(&path).unwrap();
    }
}
