//! Real-time frame streaming session
//!
//! One session is one exercise attempt over a single full-duplex channel:
//! - Channel: event-driven state machine (`Connecting → Open → Closing → Closed`, or `Errored`)
//! - Protocol: handshake encoding and inbound message classification
//! - Flow control: drop-over-buffer gate between capture and transport
//! - Transport: writer task owning the websocket write half
//! - Coordinator: connects the pieces and owns the session lifecycle
//!
//! # Flow
//!
//! ```text
//! FrameSource → Capturer → FlowController → writer → analysis service
//! analysis service → coordinator → DisplaySink | ScoreRecorder
//! ```

pub mod channel;
pub mod coordinator;
pub mod error;
pub mod flow;
pub mod health;
pub mod protocol;
pub mod state;
pub mod transport;
pub mod types;

pub use channel::SessionChannel;
pub use coordinator::{SessionCoordinator, SessionOutcome, SessionReport, SessionSettings};
pub use error::SessionError;
pub use health::{HealthSummary, SessionHealth};
pub use state::ChannelState;
pub use types::{AnnotatedFrame, Frame, ScoreEvent, SessionInfo};
