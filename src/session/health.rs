//! Health counters for a streaming session

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for a session
///
/// Shared between the session loop and the transport writer task.
/// All fields use atomic operations for thread-safe access.
#[derive(Debug, Default)]
pub struct SessionHealth {
    /// Frames obtained from the capture device
    pub frames_captured: AtomicU64,

    /// Ticks where the device had no frame to give
    pub capture_failures: AtomicU64,

    /// Frames written to the transport
    pub frames_sent: AtomicU64,

    /// Frames discarded by flow control
    pub frames_dropped: AtomicU64,

    /// Annotated frames received from the analysis service
    pub annotated_received: AtomicU64,

    /// Inbound messages ignored as unrecognized
    pub malformed_messages: AtomicU64,
}

impl SessionHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_capture(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_annotated(&self) {
        self.annotated_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Share of captured frames that flow control discarded, in percent
    pub fn drop_rate(&self) -> f64 {
        let captured = self.frames_captured.load(Ordering::Relaxed);
        if captured == 0 {
            return 0.0;
        }
        (self.frames_dropped() as f64 / captured as f64) * 100.0
    }

    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            frames_sent: self.frames_sent(),
            frames_dropped: self.frames_dropped(),
            annotated_received: self.annotated_received.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
            drop_rate: self.drop_rate(),
        }
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSummary {
    pub frames_captured: u64,
    pub capture_failures: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub annotated_received: u64,
    pub malformed_messages: u64,
    pub drop_rate: f64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} captured ({} failed), {} sent, {} dropped ({:.1}%), {} annotated, {} ignored",
            self.frames_captured,
            self.capture_failures,
            self.frames_sent,
            self.frames_dropped,
            self.drop_rate,
            self.annotated_received,
            self.malformed_messages
        )
    }
}
