//! Background commentary on human moves.
//!
//! Each request runs on its own thread and reports back over a channel the
//! controller drains once per tick, so a slow or absent text-generation
//! service never holds up a frame.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Shown whenever the service cannot produce a comment.
pub const FALLBACK_TEXT: &str = "No feedback available.";

pub const BLUNDER_THRESHOLD: i32 = -150;
pub const INACCURACY_THRESHOLD: i32 = -60;
pub const GOOD_THRESHOLD: i32 = 60;

pub const DEFAULT_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_URL: &str = "http://localhost:11434/api/generate";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum CommentaryError {
    #[error("commentary request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("commentary service returned no text")]
    Empty,
}

/// Coarse verdict on a move, derived only from its centipawn swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveClass {
    Blunder,
    Inaccuracy,
    Good,
    Okay,
}

impl MoveClass {
    /// Unscored moves are classed as okay.
    pub fn from_delta(delta: Option<i32>) -> Self {
        match delta {
            Some(d) if d <= BLUNDER_THRESHOLD => MoveClass::Blunder,
            Some(d) if d <= INACCURACY_THRESHOLD => MoveClass::Inaccuracy,
            Some(d) if d >= GOOD_THRESHOLD => MoveClass::Good,
            _ => MoveClass::Okay,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoveClass::Blunder => "a blunder",
            MoveClass::Inaccuracy => "an inaccuracy",
            MoveClass::Good => "a good move",
            MoveClass::Okay => "an okay move",
        }
    }
}

/// Everything the service needs to comment on one human move, plus the
/// slot the answer belongs to.
#[derive(Debug, Clone)]
pub struct CommentaryRequest {
    pub generation: u64,
    pub slot: usize,
    /// Position before the move.
    pub fen: String,
    pub san: String,
    pub delta: Option<i32>,
}

impl CommentaryRequest {
    pub fn class(&self) -> MoveClass {
        MoveClass::from_delta(self.delta)
    }

    pub fn prompt(&self) -> String {
        let swing = match self.delta {
            Some(delta) => format!("a swing of {:+} centipawns for the player", delta),
            None => "an unknown swing".to_string(),
        };
        format!(
            "You are a concise chess coach. In the position {} the player played {}. \
             The engine rates it as {} ({}). \
             In one short sentence, tell the player what the move achieved or missed.",
            self.fen,
            self.san,
            self.class().label(),
            swing
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryReply {
    pub generation: u64,
    pub slot: usize,
    pub text: String,
}

pub trait CommentaryBackend: Send + Sync {
    fn comment(&self, prompt: &str) -> Result<String, CommentaryError>;
}

#[derive(Debug, Clone)]
pub struct OllamaSettings {
    pub model: String,
    pub url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            url: DEFAULT_URL.to_string(),
            max_tokens: 40,
            temperature: 0.15,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming client for a local Ollama `generate` endpoint.
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    settings: OllamaSettings,
}

impl OllamaBackend {
    pub fn new(settings: OllamaSettings) -> Result<Self, CommentaryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, settings })
    }
}

impl CommentaryBackend for OllamaBackend {
    fn comment(&self, prompt: &str) -> Result<String, CommentaryError> {
        let body = json!({
            "model": self.settings.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": self.settings.max_tokens,
                "temperature": self.settings.temperature,
            },
        });

        let reply: GenerateResponse = self
            .client
            .post(&self.settings.url)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        let text = reply.response.trim();
        if text.is_empty() {
            return Err(CommentaryError::Empty);
        }
        Ok(text.to_string())
    }
}

/// Stands in for the service when commentary is switched off.
pub struct DisabledBackend;

impl CommentaryBackend for DisabledBackend {
    fn comment(&self, _prompt: &str) -> Result<String, CommentaryError> {
        Ok(FALLBACK_TEXT.to_string())
    }
}

pub struct CommentaryChannel {
    backend: Arc<dyn CommentaryBackend>,
    sender: Sender<CommentaryReply>,
    replies: Receiver<CommentaryReply>,
}

impl CommentaryChannel {
    pub fn new(backend: Arc<dyn CommentaryBackend>) -> Self {
        let (sender, replies) = crossbeam_channel::unbounded();
        Self {
            backend,
            sender,
            replies,
        }
    }

    /// Starts one request in the background. Every request produces exactly
    /// one reply, falling back to [`FALLBACK_TEXT`] on any failure.
    pub fn dispatch(&self, request: CommentaryRequest) {
        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        let generation = request.generation;
        let slot = request.slot;

        let spawned = thread::Builder::new()
            .name("commentary".to_string())
            .spawn(move || {
                let text = match backend.comment(&request.prompt()) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!("commentary for {} failed: {}", request.san, error);
                        FALLBACK_TEXT.to_string()
                    }
                };
                // the receiver is gone once the app has shut down
                let _ = sender.send(CommentaryReply {
                    generation: request.generation,
                    slot: request.slot,
                    text,
                });
            });

        if let Err(error) = spawned {
            warn!("could not start commentary thread: {}", error);
            let _ = self.sender.send(CommentaryReply {
                generation,
                slot,
                text: FALLBACK_TEXT.to_string(),
            });
        }
    }

    /// Replies that have arrived since the last call, without blocking.
    pub fn drain(&self) -> Vec<CommentaryReply> {
        let replies: Vec<CommentaryReply> = self.replies.try_iter().collect();
        if !replies.is_empty() {
            debug!("received {} commentary replies", replies.len());
        }
        replies
    }

    #[cfg(test)]
    pub(crate) fn wait_for_reply(&self, timeout: Duration) -> Option<CommentaryReply> {
        self.replies.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingBackend {
        prompts: Mutex<Vec<String>>,
        answer: Option<&'static str>,
    }

    impl RecordingBackend {
        fn answering(answer: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                answer,
            })
        }
    }

    impl CommentaryBackend for RecordingBackend {
        fn comment(&self, prompt: &str) -> Result<String, CommentaryError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer
                .map(str::to_string)
                .ok_or(CommentaryError::Empty)
        }
    }

    fn request(slot: usize, delta: Option<i32>) -> CommentaryRequest {
        CommentaryRequest {
            generation: 4,
            slot,
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            san: "e4".to_string(),
            delta,
        }
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(MoveClass::from_delta(Some(-150)), MoveClass::Blunder);
        assert_eq!(MoveClass::from_delta(Some(-149)), MoveClass::Inaccuracy);
        assert_eq!(MoveClass::from_delta(Some(-60)), MoveClass::Inaccuracy);
        assert_eq!(MoveClass::from_delta(Some(-59)), MoveClass::Okay);
        assert_eq!(MoveClass::from_delta(Some(59)), MoveClass::Okay);
        assert_eq!(MoveClass::from_delta(Some(60)), MoveClass::Good);
        assert_eq!(MoveClass::from_delta(None), MoveClass::Okay);
    }

    #[test]
    fn test_prompt_mentions_move_and_verdict() {
        let prompt = request(0, Some(-200)).prompt();
        assert!(prompt.contains("played e4"));
        assert!(prompt.contains("a blunder"));
        assert!(prompt.contains("-200 centipawns"));

        let unscored = request(0, None).prompt();
        assert!(unscored.contains("an unknown swing"));
    }

    #[test]
    fn test_reply_keeps_generation_and_slot() {
        let backend = RecordingBackend::answering(Some("Solid central control."));
        let channel = CommentaryChannel::new(backend.clone());
        channel.dispatch(request(6, Some(30)));

        let reply = channel.wait_for_reply(Duration::from_secs(5)).unwrap();
        assert_eq!(
            reply,
            CommentaryReply {
                generation: 4,
                slot: 6,
                text: "Solid central control.".to_string(),
            }
        );
        assert_eq!(backend.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failure_degrades_to_fallback_text() {
        let channel = CommentaryChannel::new(RecordingBackend::answering(None));
        channel.dispatch(request(2, Some(-80)));

        let reply = channel.wait_for_reply(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.slot, 2);
        assert_eq!(reply.text, FALLBACK_TEXT);
    }

    #[test]
    fn test_disabled_backend_answers_with_fallback() {
        let channel = CommentaryChannel::new(Arc::new(DisabledBackend));
        channel.dispatch(request(0, None));

        let reply = channel.wait_for_reply(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.text, FALLBACK_TEXT);
        assert!(channel.drain().is_empty());
    }

    #[test]
    fn test_drain_without_replies_is_empty() {
        let channel = CommentaryChannel::new(Arc::new(DisabledBackend));
        assert!(channel.drain().is_empty());
    }
}
