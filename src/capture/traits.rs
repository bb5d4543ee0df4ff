//! Traits for camera capture functionality

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Why a capture tick produced no frame
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device busy, not yet permitted, or already released
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("capture I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for frame capture devices
///
/// Implementations know nothing about the network. A failed capture only
/// costs the current tick.
#[async_trait]
pub trait FrameSource: Send {
    /// Grab one encoded frame from the device
    async fn capture_frame(&mut self) -> Result<Bytes, CaptureError>;

    /// Release the device. Later captures report `Unavailable`.
    async fn release(&mut self);

    /// Name of the device for logging
    fn name(&self) -> &str;
}
