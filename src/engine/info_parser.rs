//! Parsing of the lines a UCI engine writes to stdout.

use std::str::FromStr;

use super::Score;

/// Messages the adaptive core cares about; everything else is `Other`.
#[derive(Debug, PartialEq, Clone)]
pub enum EngineMessage {
    UciOk,
    ReadyOk,
    /// `option name <name> type ...`
    Option { name: String },
    Info(InfoLine),
    /// `bestmove <move>`; `None` for `bestmove (none)` or a bare `bestmove`.
    BestMove { uci: Option<String> },
    Other(String),
}

/// The parts of an `info` line used for analysis.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct InfoLine {
    pub multipv: usize,
    pub depth: Option<u32>,
    pub score: Option<Score>,
    /// First move of the principal variation, in UCI text.
    pub pv_first: Option<String>,
}

impl InfoLine {
    /// Lines that carry neither a score nor a principal move are progress chatter.
    pub fn is_analysis(&self) -> bool {
        self.score.is_some() || self.pv_first.is_some()
    }
}

impl FromStr for EngineMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split_whitespace().collect();
        let keyword = match parts.first() {
            Some(keyword) => *keyword,
            None => return Ok(EngineMessage::Other(String::new())),
        };

        match keyword {
            "uciok" => Ok(EngineMessage::UciOk),
            "readyok" => Ok(EngineMessage::ReadyOk),
            "option" => parse_option(&parts[1..]),
            "info" => parse_info(&parts[1..]).map(EngineMessage::Info),
            "bestmove" => Ok(parse_bestmove(&parts[1..])),
            _ => Ok(EngineMessage::Other(s.to_string())),
        }
    }
}

fn parse_option(parts: &[&str]) -> Result<EngineMessage, String> {
    if parts.first() != Some(&"name") {
        return Err("option line without a name".to_string());
    }

    let name: Vec<&str> = parts[1..]
        .iter()
        .take_while(|part| **part != "type")
        .copied()
        .collect();
    if name.is_empty() {
        return Err("option line with an empty name".to_string());
    }

    Ok(EngineMessage::Option {
        name: name.join(" "),
    })
}

fn parse_info(parts: &[&str]) -> Result<InfoLine, String> {
    let mut info = InfoLine {
        multipv: 1,
        ..InfoLine::default()
    };

    let mut i = 0;
    while i < parts.len() {
        match parts[i] {
            "multipv" => {
                info.multipv = parse_value(parts, i + 1, "multipv")?;
                i += 2;
            }
            "depth" => {
                info.depth = Some(parse_value(parts, i + 1, "depth")?);
                i += 2;
            }
            "score" => {
                let kind = parts.get(i + 1).copied();
                let value: i32 = parse_value(parts, i + 2, "score")?;
                info.score = match kind {
                    Some("cp") => Some(Score::Centipawns(value)),
                    Some("mate") => Some(Score::Mate(value)),
                    _ => return Err(format!("unknown score kind {:?}", kind)),
                };
                i += 3;
            }
            "pv" => {
                info.pv_first = parts.get(i + 1).map(|m| m.to_string());
                break;
            }
            // free text runs to the end of the line
            "string" => break,
            _ => i += 1,
        }
    }

    Ok(info)
}

fn parse_bestmove(parts: &[&str]) -> EngineMessage {
    let uci = parts
        .first()
        .filter(|m| **m != "(none)" && **m != "0000")
        .map(|m| m.to_string());
    EngineMessage::BestMove { uci }
}

fn parse_value<T: FromStr>(parts: &[&str], index: usize, field: &str) -> Result<T, String> {
    parts
        .get(index)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| format!("missing or invalid value for {}", field))
}
