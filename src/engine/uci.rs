use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use shakmaty::{Chess, Move};

use crate::rules::{fen_of, move_from_uci};

use super::info_parser::{EngineMessage, InfoLine};
use super::{AnalysisLine, Capabilities, EngineError, EngineOption, SearchEngine};

/// Slack on top of a search budget before the engine is considered hung.
const PROTOCOL_TIMEOUT: Duration = Duration::from_secs(5);
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// An engine binary spoken to over UCI on stdin/stdout.
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    capabilities: Capabilities,
    multipv: usize,
}

impl UciEngine {
    pub fn spawn(path: &Path) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        let stdin = process.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = process.stdout.take().ok_or(EngineError::Closed)?;

        // stdout is drained on its own thread so every read can time out
        let (sender, lines) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut engine = Self {
            process,
            stdin,
            lines,
            capabilities: Capabilities::default(),
            multipv: 1,
        };
        engine.handshake()?;
        info!(
            "engine {} ready (limit strength: {}, rating target: {}, skill level: {})",
            path.display(),
            engine.capabilities.limit_strength,
            engine.capabilities.rating_target,
            engine.capabilities.skill_level
        );
        Ok(engine)
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        let deadline = Instant::now() + PROTOCOL_TIMEOUT;
        loop {
            match self.read_message(deadline, "uciok")? {
                EngineMessage::UciOk => break,
                EngineMessage::Option { name } => match name.as_str() {
                    "UCI_LimitStrength" => self.capabilities.limit_strength = true,
                    "UCI_Elo" => self.capabilities.rating_target = true,
                    "Skill Level" => self.capabilities.skill_level = true,
                    _ => {}
                },
                _ => {}
            }
        }
        self.sync()
    }

    fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("engine <- {}", command);
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_message(
        &mut self,
        deadline: Instant,
        waiting_for: &'static str,
    ) -> Result<EngineMessage, EngineError> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        let line = match self.lines.recv_timeout(timeout) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => return Err(EngineError::Timeout { waiting_for }),
            Err(RecvTimeoutError::Disconnected) => return Err(EngineError::Closed),
        };
        debug!("engine -> {}", line);

        match line.parse::<EngineMessage>() {
            Ok(message) => Ok(message),
            Err(error) => {
                debug!("ignoring unparsable engine line {:?}: {}", line, error);
                Ok(EngineMessage::Other(line))
            }
        }
    }

    /// Waits for `readyok`, discarding anything left over from earlier commands.
    fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        let deadline = Instant::now() + PROTOCOL_TIMEOUT;
        loop {
            if let EngineMessage::ReadyOk = self.read_message(deadline, "readyok")? {
                return Ok(());
            }
        }
    }

    fn set_option(&mut self, option: &EngineOption) -> Result<(), EngineError> {
        self.send(&format!(
            "setoption name {} value {}",
            option.name(),
            option.value()
        ))
    }

    fn set_multipv(&mut self, lines: usize) -> Result<(), EngineError> {
        let lines = lines.max(1);
        if lines != self.multipv {
            self.set_option(&EngineOption::MultiPv(lines))?;
            self.multipv = lines;
        }
        Ok(())
    }

    /// Runs one timed search, returning the latest analysis per line and the best move text.
    fn search(
        &mut self,
        position: &Chess,
        budget: Duration,
        lines: usize,
    ) -> Result<(BTreeMap<usize, InfoLine>, Option<String>), EngineError> {
        self.sync()?;
        self.set_multipv(lines)?;
        self.send(&format!("position fen {}", fen_of(position)))?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1)))?;

        let deadline = Instant::now() + budget + PROTOCOL_TIMEOUT;
        let mut latest: BTreeMap<usize, InfoLine> = BTreeMap::new();
        loop {
            let message = match self.read_message(deadline, "bestmove") {
                Ok(message) => message,
                Err(EngineError::Timeout { waiting_for }) => {
                    // leave the engine idle for the next request
                    let _ = self.send("stop");
                    return Err(EngineError::Timeout { waiting_for });
                }
                Err(error) => return Err(error),
            };

            match message {
                EngineMessage::Info(info) if info.is_analysis() => {
                    latest.insert(info.multipv, info);
                }
                EngineMessage::BestMove { uci } => return Ok((latest, uci)),
                _ => {}
            }
        }
    }
}

impl SearchEngine for UciEngine {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn configure(&mut self, options: &[EngineOption]) -> Result<(), EngineError> {
        for option in options {
            self.set_option(option)?;
        }
        self.sync()
    }

    fn analyze(
        &mut self,
        position: &Chess,
        budget: Duration,
        lines: usize,
    ) -> Result<Vec<AnalysisLine>, EngineError> {
        let (latest, _) = self.search(position, budget, lines)?;
        Ok(latest
            .into_values()
            .take(lines.max(1))
            .map(|info| AnalysisLine {
                best_move: info
                    .pv_first
                    .as_deref()
                    .and_then(|text| move_from_uci(position, text)),
                score: info.score,
            })
            .collect())
    }

    fn play(&mut self, position: &Chess, budget: Duration) -> Result<Move, EngineError> {
        let (_, best) = self.search(position, budget, 1)?;
        let text = best.ok_or(EngineError::NoMove)?;
        move_from_uci(position, &text).ok_or_else(|| {
            EngineError::Protocol(format!(
                "bestmove {} is not legal in {}",
                text,
                fen_of(position)
            ))
        })
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let deadline = Instant::now() + QUIT_GRACE;
        while Instant::now() < deadline {
            match self.process.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(_) => break,
            }
        }
        warn!("engine did not quit in time, killing it");
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
