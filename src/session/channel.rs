//! Event-driven session channel
//!
//! Every transport callback becomes a transition on [`SessionChannel`]. The
//! channel never touches the network itself; it tells the coordinator what to
//! do through [`Action`], which keeps the protocol testable with synthetic
//! events.

use log::{debug, info, warn};

use crate::session::error::SessionError;
use crate::session::protocol::{Handshake, Inbound};
use crate::session::state::ChannelState;
use crate::session::types::{AnnotatedFrame, ScoreEvent, SessionInfo};

/// What the coordinator must do after an inbound event
#[derive(Debug)]
pub enum Action {
    /// Nothing to do
    Ignore,
    /// Show the frame in the live view
    Display(AnnotatedFrame),
    /// The session produced its score; tear down and record it
    Finalize(ScoreEvent),
    /// The session failed; tear down without a score
    Fail(SessionError),
}

pub struct SessionChannel {
    info: SessionInfo,
    state: ChannelState,
    handshakes_sent: u32,
    score_received: bool,
}

impl SessionChannel {
    pub fn new(info: SessionInfo) -> Self {
        Self {
            info,
            state: ChannelState::Connecting,
            handshakes_sent: 0,
            score_received: false,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn handshakes_sent(&self) -> u32 {
        self.handshakes_sent
    }

    pub fn score_received(&self) -> bool {
        self.score_received
    }

    /// Frames may only leave while the channel is open and unscored
    pub fn can_send_frame(&self) -> bool {
        self.state.is_open() && !self.score_received
    }

    /// Transport is up: move to `Open` and return the handshake to send.
    ///
    /// Valid once, from `Connecting` only.
    pub fn open(&mut self) -> Result<String, SessionError> {
        let handshake = Handshake::new(&self.info).encode()?;
        self.transition(ChannelState::Open)?;
        self.handshakes_sent += 1;
        Ok(handshake)
    }

    pub fn on_inbound(&mut self, inbound: Inbound) -> Action {
        match inbound {
            Inbound::Annotated(data) if self.state.is_open() => {
                Action::Display(AnnotatedFrame::new(data))
            }
            Inbound::Annotated(_) => Action::Ignore,
            Inbound::Score(value) => self.on_score(value),
            Inbound::Rejected(reason) if self.state.is_open() => {
                warn!("Session {}: rejected by analysis service: {}", self.info, reason);
                self.force(ChannelState::Errored);
                Action::Fail(SessionError::Rejected(reason))
            }
            Inbound::Rejected(reason) => {
                debug!("Session {}: late rejection ignored: {}", self.info, reason);
                Action::Ignore
            }
            Inbound::Malformed(preview) => {
                warn!(
                    "Session {}: ignoring unrecognized message {:?}",
                    self.info, preview
                );
                Action::Ignore
            }
            Inbound::Control => Action::Ignore,
            Inbound::PeerClosed => self.on_transport_closed(),
        }
    }

    fn on_score(&mut self, value: f64) -> Action {
        if !self.state.is_open() || self.score_received {
            debug!(
                "Session {}: score {} ignored in state {}",
                self.info, value, self.state
            );
            return Action::Ignore;
        }
        self.score_received = true;
        self.force(ChannelState::Closing);
        info!("Session {}: final score {}", self.info, value);
        Action::Finalize(ScoreEvent::new(&self.info, value))
    }

    /// Peer closed the transport
    pub fn on_transport_closed(&mut self) -> Action {
        match self.state {
            ChannelState::Closing => {
                self.force(ChannelState::Closed);
                Action::Ignore
            }
            ChannelState::Connecting | ChannelState::Open => {
                self.force(ChannelState::Errored);
                Action::Fail(SessionError::TransportClosed)
            }
            ChannelState::Closed | ChannelState::Errored => Action::Ignore,
        }
    }

    /// Transport-level failure (connect error, I/O error, write failure)
    pub fn fail(&mut self, reason: &SessionError) {
        match self.state {
            ChannelState::Connecting | ChannelState::Open => {
                warn!("Session {}: transport failed: {}", self.info, reason);
                self.force(ChannelState::Errored);
            }
            ChannelState::Closing => self.force(ChannelState::Closed),
            ChannelState::Closed | ChannelState::Errored => {}
        }
    }

    /// Owner cancelled the attempt. No score is produced.
    pub fn cancel(&mut self) {
        if matches!(self.state, ChannelState::Connecting | ChannelState::Open) {
            info!("Session {}: cancelled in state {}", self.info, self.state);
            self.force(ChannelState::Closed);
        }
    }

    /// Transport teardown after a score finished
    pub fn finish_close(&mut self) {
        if self.state == ChannelState::Closing {
            self.force(ChannelState::Closed);
        }
    }

    fn transition(&mut self, target: ChannelState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(&target) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        debug!("Session {}: {} -> {}", self.info, self.state, target);
        self.state = target;
        Ok(())
    }

    /// Transition already known to be valid from the caller's match
    fn force(&mut self, target: ChannelState) {
        if let Err(e) = self.transition(target) {
            warn!("Session {}: {}", self.info, e);
        }
    }
}
