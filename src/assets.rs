use std::time::Duration;

/// Nominal capture cadence (~10 frames per second).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

// connections
pub const ANALYSIS_PATH: &str = "/pose/ws/analyze";
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000";
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8000/api";
pub const SCORE_ROUTE: &str = "scores/add";

// inbound text sentinels
pub const SCORE_SENTINEL: &str = "SCORE:";
pub const ERROR_SENTINEL: &str = "ERROR:";

/// Image extensions replayed by the directory frame source.
pub const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Scores outside this range are persisted unchanged but reported.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;
