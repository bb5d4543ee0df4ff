use async_tungstenite::tungstenite;
use thiserror::Error;

use super::state::ChannelState;

/// Failures that end a session without a score.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not reach the analysis service: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("analysis service rejected the session: {0}")]
    Rejected(String),

    #[error("transport closed before a score was received")]
    TransportClosed,

    #[error("transport failure: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode handshake: {0}")]
    Handshake(#[from] serde_json::Error),

    #[error("invalid channel transition {from} -> {to}")]
    InvalidTransition {
        from: ChannelState,
        to: ChannelState,
    },

    #[error("outbound queue closed")]
    QueueClosed,
}
