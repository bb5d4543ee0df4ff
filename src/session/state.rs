//! Session channel state management

/// Channel state machine
///
/// `Closed` and `Errored` are terminal. `Errored` is only entered on a
/// transport-level failure or a rejection by the analysis service, and a
/// session that ends there never produces a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Transport requested, nothing may be sent yet
    Connecting,

    /// Handshake sent, frames flow in both directions
    Open,

    /// Terminal score received, transport is being torn down
    Closing,

    /// Transport closed
    Closed,

    /// Transport failed or the session was rejected
    Errored,
}

impl ChannelState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &ChannelState) -> bool {
        use ChannelState::*;

        match (self, target) {
            // From Connecting
            (Connecting, Open) => true,
            (Connecting, Closed) => true, // Cancelled before the transport came up
            (Connecting, Errored) => true,

            // From Open
            (Open, Closing) => true,
            (Open, Closed) => true, // Cancelled by the owner
            (Open, Errored) => true,

            // From Closing
            (Closing, Closed) => true,

            // Terminal states absorb everything
            (Closed, _) | (Errored, _) => false,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            ChannelState::Connecting => "Connecting",
            ChannelState::Open => "Open",
            ChannelState::Closing => "Closing",
            ChannelState::Closed => "Closed",
            ChannelState::Errored => "Errored",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }

    /// Check if the channel reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Errored)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
