//! Flow control between the capture loop and the transport writer
//!
//! A frame is handed to the writer only when the channel is open and the
//! previous message has been accepted by the transport. Otherwise it is
//! dropped on the spot: the newest frame always wins over a stale backlog, so
//! at most one frame is ever in flight.

use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use crate::session::error::SessionError;
use crate::session::health::SessionHealth;
use crate::session::types::Frame;

/// Message queued for the transport writer
#[derive(Debug)]
pub enum Outbound {
    Handshake(String),
    Frame(Frame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Channel is not in `Open`
    NotOpen,
    /// Previous message still being written
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDecision {
    Sent,
    Dropped(DropReason),
}

/// Producer side, owned by the session loop
pub struct FlowController {
    tx: mpsc::Sender<Outbound>,
    ready: Arc<AtomicBool>,
    health: Arc<SessionHealth>,
}

/// Consumer side, owned by the transport writer
pub struct OutboundQueue {
    rx: mpsc::Receiver<Outbound>,
    ready: Arc<AtomicBool>,
    health: Arc<SessionHealth>,
}

impl FlowController {
    pub fn new(health: Arc<SessionHealth>) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::channel(1);
        let ready = Arc::new(AtomicBool::new(true));
        (
            Self {
                tx,
                ready: Arc::clone(&ready),
                health: Arc::clone(&health),
            },
            OutboundQueue { rx, ready, health },
        )
    }

    /// Queue the handshake. Must be the first message of the session.
    pub async fn send_handshake(&self, handshake: String) -> Result<(), SessionError> {
        self.ready.store(false, Ordering::Release);
        self.tx
            .send(Outbound::Handshake(handshake))
            .await
            .map_err(|_| SessionError::QueueClosed)
    }

    /// Whether the transport accepted everything handed to it so far
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Transmit or drop one captured frame. Never waits.
    pub fn offer(&self, channel_open: bool, frame: Frame) -> FlowDecision {
        let decision = if !channel_open {
            FlowDecision::Dropped(DropReason::NotOpen)
        } else if !self.ready.swap(false, Ordering::AcqRel) {
            FlowDecision::Dropped(DropReason::Backpressure)
        } else {
            match self.tx.try_send(Outbound::Frame(frame)) {
                Ok(()) => FlowDecision::Sent,
                Err(_) => {
                    self.ready.store(true, Ordering::Release);
                    FlowDecision::Dropped(DropReason::Backpressure)
                }
            }
        };

        if let FlowDecision::Dropped(reason) = decision {
            debug!("Flow control dropped a frame: {:?}", reason);
            self.health.record_drop();
        }
        decision
    }
}

impl OutboundQueue {
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }

    /// The transport accepted the last message; the next frame may go
    pub fn mark_sent(&self, message: &Outbound) {
        if matches!(message, Outbound::Frame(_)) {
            self.health.record_sent();
        }
        self.ready.store(true, Ordering::Release);
    }
}
