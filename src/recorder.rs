//! Score persistence
//!
//! The [`ScoreRecorder`] turns the terminal score of a session into a record
//! for the external data store. It submits exactly once and never retries: a
//! failure is reported back to the session owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::assets::{SCORE_RANGE, SCORE_ROUTE};
use crate::display::DisplaySink;
use crate::session::types::ScoreEvent;

/// Body accepted by the persistence API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub patient_id: u64,
    pub exercise_id: u64,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&ScoreEvent> for ScoreRecord {
    fn from(event: &ScoreEvent) -> Self {
        Self {
            patient_id: event.patient_id,
            exercise_id: event.exercise_id,
            score: event.value,
            timestamp: event.finalized_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("score store unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("score store answered {0}")]
    Status(u16),

    #[error("score store refused the record: {0}")]
    Refused(String),
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn persist(&self, record: &ScoreRecord) -> Result<(), RecordError>;
}

/// Persistence API over HTTP
pub struct HttpScoreStore {
    client: reqwest::Client,
    url: String,
}

impl HttpScoreStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/{}", base_url.trim_end_matches('/'), SCORE_ROUTE),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ScoreStore for HttpScoreStore {
    async fn persist(&self, record: &ScoreRecord) -> Result<(), RecordError> {
        let response = self.client.post(&self.url).json(record).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RecordError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Keeps records in memory. Used when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: Mutex<Vec<ScoreRecord>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ScoreRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn persist(&self, record: &ScoreRecord) -> Result<(), RecordError> {
        self.records
            .lock()
            .map_err(|_| RecordError::Refused("store poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}

pub struct ScoreRecorder {
    store: Arc<dyn ScoreStore>,
    display: DisplaySink,
}

impl ScoreRecorder {
    pub fn new(store: Arc<dyn ScoreStore>, display: DisplaySink) -> Self {
        Self { store, display }
    }

    /// End the live view and persist the score once
    pub async fn record(&self, event: &ScoreEvent) -> Result<(), RecordError> {
        self.display.terminate();

        if !SCORE_RANGE.contains(&event.value) {
            warn!(
                "ScoreRecorder: score {} outside {:?}, persisting unchanged",
                event.value, SCORE_RANGE
            );
        }

        let record = ScoreRecord::from(event);
        match self.store.persist(&record).await {
            Ok(()) => {
                info!(
                    "ScoreRecorder: stored score {} for patient {} exercise {}",
                    record.score, record.patient_id, record.exercise_id
                );
                Ok(())
            }
            Err(e) => {
                error!("ScoreRecorder: failed to store score {}: {}", record.score, e);
                Err(e)
            }
        }
    }
}
