//! Streams live exercise frames to a pose-analysis service, shows the
//! annotated frames it returns, and records the final score of the attempt.

pub mod assets;
pub mod capture;
pub mod config;
pub mod display;
pub mod recorder;
pub mod session;
