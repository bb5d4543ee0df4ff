//! Camera capture module
//!
//! A [`FrameSource`] yields encoded frames from a device; the [`Capturer`]
//! drives it on a fixed-period timer for the lifetime of a session.

pub mod capturer;
pub mod directory;
mod traits;

pub use capturer::Capturer;
pub use directory::DirectorySource;
pub use traits::{CaptureError, FrameSource};
