//! Wire format of the analysis channel
//!
//! Outbound: one JSON handshake text, then raw binary frames.
//! Inbound: binary annotated frames, or a text message. A text message is the
//! terminal score iff it starts with `SCORE:`; `ERROR:` means the service
//! refused the session. Anything else is ignored.

use async_tungstenite::tungstenite::Message;
use bytes::Bytes;
use serde::Serialize;

use crate::assets::{ERROR_SENTINEL, SCORE_SENTINEL};
use crate::session::error::SessionError;
use crate::session::types::SessionInfo;

/// First outbound message of every session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Handshake {
    pub exercise_id: u64,
    pub patient_id: u64,
    /// Attempt start in fractional Unix seconds
    pub timestamp: f64,
}

impl Handshake {
    pub fn new(info: &SessionInfo) -> Self {
        Self {
            exercise_id: info.exercise_id,
            patient_id: info.patient_id,
            timestamp: info.started_at.timestamp_millis() as f64 / 1000.0,
        }
    }

    pub fn encode(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Classified inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Annotated(Bytes),
    Score(f64),
    Rejected(String),
    /// Unrecognized payload, kept for logging
    Malformed(String),
    /// Ping/pong and raw frames handled by the transport
    Control,
    PeerClosed,
}

pub fn classify(message: Message) -> Inbound {
    match message {
        Message::Binary(data) => Inbound::Annotated(data),
        Message::Text(text) => parse_text(text.as_str()),
        Message::Close(_) => Inbound::PeerClosed,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Inbound::Control,
    }
}

pub fn parse_text(text: &str) -> Inbound {
    if let Some(raw) = text.strip_prefix(SCORE_SENTINEL) {
        return match parse_score(raw) {
            Some(value) => Inbound::Score(value),
            None => Inbound::Malformed(preview(text)),
        };
    }
    if let Some(reason) = text.strip_prefix(ERROR_SENTINEL) {
        return Inbound::Rejected(reason.trim().to_string());
    }
    Inbound::Malformed(preview(text))
}

fn parse_score(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

fn preview(text: &str) -> String {
    const MAX: usize = 64;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
