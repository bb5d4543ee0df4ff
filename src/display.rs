//! Live view of annotated frames
//!
//! Only the most recent annotated frame is kept. Each new frame overwrites
//! the previous one, so a slow viewer never sees a backlog.

use std::sync::Arc;
use tokio::sync::watch;

use crate::session::types::AnnotatedFrame;

#[derive(Debug, Clone, Default)]
pub enum LiveView {
    /// Session started, no annotated frame yet
    #[default]
    Waiting,
    Frame(AnnotatedFrame),
    /// Session over; the view should be torn down
    Ended,
}

impl LiveView {
    pub fn is_ended(&self) -> bool {
        matches!(self, LiveView::Ended)
    }
}

#[derive(Debug, Clone)]
pub struct DisplaySink {
    tx: Arc<watch::Sender<LiveView>>,
}

impl Default for DisplaySink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LiveView::Waiting);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveView> {
        self.tx.subscribe()
    }

    /// Replace the shown frame. Ignored once the view has ended.
    pub fn present(&self, frame: AnnotatedFrame) {
        self.tx.send_if_modified(|view| {
            if view.is_ended() {
                return false;
            }
            *view = LiveView::Frame(frame);
            true
        });
    }

    pub fn terminate(&self) {
        self.tx.send_replace(LiveView::Ended);
    }

    pub fn latest(&self) -> LiveView {
        self.tx.borrow().clone()
    }
}
