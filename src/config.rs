use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::assets::{ANALYSIS_PATH, DEFAULT_ENDPOINT, DEFAULT_STORE_URL, FRAME_INTERVAL};
use crate::session::{SessionInfo, SessionSettings};

#[derive(Debug, Clone, Parser)]
#[command(name = "formcast", version, about)]
pub struct Config {
    /// Base websocket URL of the analysis service
    #[arg(long, env = "FORMCAST_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Path of the analysis endpoint on the service
    #[arg(long, default_value = ANALYSIS_PATH)]
    pub analysis_path: String,

    /// Base URL of the score persistence API
    #[arg(long, env = "FORMCAST_STORE_URL", default_value = DEFAULT_STORE_URL)]
    pub store_url: String,

    /// Capture period in milliseconds
    #[arg(long, default_value_t = FRAME_INTERVAL.as_millis() as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_interval_ms: u64,

    #[arg(long)]
    pub patient_id: u64,

    #[arg(long)]
    pub exercise_id: u64,

    /// Directory of encoded images replayed as the camera feed
    #[arg(long)]
    pub frames_dir: PathBuf,

    /// Log the score instead of sending it to the persistence API
    #[arg(long)]
    pub no_persist: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            bail!("endpoint must be a ws:// or wss:// URL, got {}", self.endpoint);
        }
        if !self.no_persist
            && !(self.store_url.starts_with("http://") || self.store_url.starts_with("https://"))
        {
            bail!("store URL must be http:// or https://, got {}", self.store_url);
        }
        Ok(())
    }

    pub fn analysis_url(&self) -> String {
        let path = self.analysis_path.trim_start_matches('/');
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            analysis_url: self.analysis_url(),
            frame_interval: self.frame_interval(),
        }
    }

    /// Identifiers for a new attempt starting now
    pub fn session_info(&self) -> SessionInfo {
        SessionInfo::new(self.patient_id, self.exercise_id)
    }
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}
