//! Core types exchanged over a session

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Identifies one exercise attempt.
///
/// Built by the session owner and handed to the session explicitly; nothing
/// in the crate reads these identifiers from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub patient_id: u64,
    pub exercise_id: u64,
    pub started_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Start a new attempt now
    pub fn new(patient_id: u64, exercise_id: u64) -> Self {
        Self::started_at(patient_id, exercise_id, Utc::now())
    }

    pub fn started_at(patient_id: u64, exercise_id: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            patient_id,
            exercise_id,
            started_at,
        }
    }
}

impl std::fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient {} / exercise {}",
            self.patient_id, self.exercise_id
        )
    }
}

/// A captured, encoded camera frame.
///
/// Immutable once captured. Ownership moves into the outbound queue on
/// transmission and the frame is not retained afterwards.
#[derive(Clone)]
pub struct Frame {
    /// Encoded image payload
    pub data: Bytes,
    /// Ordinal position among captured frames, starting at 1
    pub sequence: u64,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(data: Bytes, sequence: u64) -> Self {
        Self {
            data,
            sequence,
            captured_at: Instant::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("size", &self.size())
            .finish()
    }
}

/// Frame returned by the analysis service with pose annotations drawn on it.
#[derive(Clone)]
pub struct AnnotatedFrame {
    pub data: Bytes,
    pub received_at: Instant,
}

impl AnnotatedFrame {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            received_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AnnotatedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatedFrame")
            .field("size", &self.data.len())
            .finish()
    }
}

/// Terminal score of a session, produced at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    pub patient_id: u64,
    pub exercise_id: u64,
    pub value: f64,
    pub finalized_at: DateTime<Utc>,
}

impl ScoreEvent {
    pub fn new(info: &SessionInfo, value: f64) -> Self {
        Self {
            patient_id: info.patient_id,
            exercise_id: info.exercise_id,
            value,
            finalized_at: Utc::now(),
        }
    }
}
