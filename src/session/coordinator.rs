//! Session coordinator
//!
//! Runs one exercise attempt end to end: connect, handshake, stream frames,
//! show annotated frames, and hand the terminal score to the recorder.
//!
//! Inbound messages drive the channel state from a single select loop, so
//! channel state is never contended. Capture runs on its own task and reads
//! whether the channel is open through a `watch`; writes happen on a third
//! task. Neither is awaited by the loop; the flow controller only checks
//! readiness.

use async_tungstenite::WebSocketStream;
use async_tungstenite::tokio::{ConnectStream, connect_async};
use async_tungstenite::tungstenite::{self, Message};
use futures_util::StreamExt;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::capture::{Capturer, FrameSource};
use crate::display::DisplaySink;
use crate::recorder::{RecordError, ScoreRecorder, ScoreStore};
use crate::session::channel::{Action, SessionChannel};
use crate::session::error::SessionError;
use crate::session::flow::FlowController;
use crate::session::health::{HealthSummary, SessionHealth};
use crate::session::protocol::{self, Inbound};
use crate::session::state::ChannelState;
use crate::session::transport::write_loop;
use crate::session::types::{ScoreEvent, SessionInfo};

/// Transport settings for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Full websocket URL of the analysis endpoint
    pub analysis_url: String,
    pub frame_interval: Duration,
}

/// How an attempt ended, as seen by the session owner
#[derive(Debug)]
pub enum SessionOutcome {
    /// Score received; `persisted` tells whether the store accepted it
    Completed {
        event: ScoreEvent,
        persisted: Result<(), RecordError>,
    },
    /// Attempt ended without a score
    Incomplete { reason: SessionError },
    Cancelled,
}

#[derive(Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub state: ChannelState,
    pub health: HealthSummary,
}

enum Ending {
    Scored(ScoreEvent),
    Failed(SessionError),
    Cancelled,
}

pub struct SessionCoordinator<S: FrameSource> {
    settings: SessionSettings,
    channel: SessionChannel,
    /// Handed to the capture task while streaming
    capturer: Option<Capturer<S>>,
    recorder: ScoreRecorder,
    display: DisplaySink,
    health: Arc<SessionHealth>,
    cancel: CancellationToken,
}

impl<S: FrameSource + 'static> SessionCoordinator<S> {
    pub fn new(
        settings: SessionSettings,
        info: SessionInfo,
        source: S,
        store: Arc<dyn ScoreStore>,
        display: DisplaySink,
    ) -> Self {
        let health = Arc::new(SessionHealth::new());
        let capturer = Capturer::new(source, settings.frame_interval, Arc::clone(&health));

        Self {
            settings,
            channel: SessionChannel::new(info),
            capturer: Some(capturer),
            recorder: ScoreRecorder::new(store, display.clone()),
            display,
            health,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels the session from any state
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn display(&self) -> &DisplaySink {
        &self.display
    }

    pub fn health(&self) -> &Arc<SessionHealth> {
        &self.health
    }

    /// Run the attempt to completion
    pub async fn run(mut self) -> SessionReport {
        info!(
            "Session {}: connecting to {}",
            self.channel.info(),
            self.settings.analysis_url
        );

        let ending = match self.connect().await {
            Ok(ws) => self.stream(ws).await,
            Err(ending) => ending,
        };

        // device goes last, after timer and transport
        if let Some(mut capturer) = self.capturer.take() {
            capturer.release().await;
        }

        let outcome = match ending {
            Ending::Scored(event) => {
                self.channel.finish_close();
                let persisted = self.recorder.record(&event).await;
                SessionOutcome::Completed { event, persisted }
            }
            Ending::Failed(reason) => {
                self.display.terminate();
                error!(
                    "Session {}: attempt incomplete: {}",
                    self.channel.info(),
                    reason
                );
                SessionOutcome::Incomplete { reason }
            }
            Ending::Cancelled => {
                self.display.terminate();
                SessionOutcome::Cancelled
            }
        };

        let health = self.health.summary();
        info!(
            "Session {}: ended {}: {}",
            self.channel.info(),
            self.channel.state(),
            health
        );

        SessionReport {
            outcome,
            state: self.channel.state(),
            health,
        }
    }

    async fn connect(&mut self) -> Result<WebSocketStream<ConnectStream>, Ending> {
        let url = self.settings.analysis_url.clone();

        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.channel.cancel();
                Err(Ending::Cancelled)
            }
            connected = connect_async(url) => match connected {
                Ok((ws, _)) => Ok(ws),
                Err(e) => {
                    let reason = SessionError::Connect(e);
                    self.channel.fail(&reason);
                    Err(Ending::Failed(reason))
                }
            },
        }
    }

    /// Move to `Open` and produce the handshake; a failure ends the channel
    fn open_channel(&mut self) -> Result<String, SessionError> {
        self.channel.open().inspect_err(|e| self.channel.fail(e))
    }

    async fn stream(&mut self, ws: WebSocketStream<ConnectStream>) -> Ending {
        let (sink, mut inbound) = ws.split();
        let (flow, queue) = FlowController::new(Arc::clone(&self.health));
        let halt = CancellationToken::new();
        let mut writer = tokio::spawn(write_loop(sink, queue, halt.clone()));
        let mut writer_done = false;

        let (open_tx, open_rx) = watch::channel(false);
        let stop_capture = CancellationToken::new();
        let mut capture = None;

        let ending = 'session: {
            let handshake = match self.open_channel() {
                Ok(handshake) => handshake,
                Err(e) => break 'session Ending::Failed(e),
            };
            if let Err(e) = flow.send_handshake(handshake).await {
                self.channel.fail(&e);
                break 'session Ending::Failed(e);
            }
            info!("Session {}: open, streaming frames", self.channel.info());

            if let Some(capturer) = self.capturer.take() {
                open_tx.send_replace(self.channel.can_send_frame());
                capture = Some(tokio::spawn(capture_loop(
                    capturer,
                    flow,
                    open_rx,
                    stop_capture.clone(),
                )));
            }

            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        self.channel.cancel();
                        break Ending::Cancelled;
                    }
                    written = &mut writer, if !writer_done => {
                        writer_done = true;
                        let reason = match written {
                            Ok(Err(e)) => e,
                            _ => SessionError::TransportClosed,
                        };
                        self.channel.fail(&reason);
                        break Ending::Failed(reason);
                    }
                    message = inbound.next() => {
                        let ending = self.on_message(message);
                        open_tx.send_replace(self.channel.can_send_frame());
                        if let Some(ending) = ending {
                            break ending;
                        }
                    }
                }
            }
        };

        // 1. stop the capture timer
        open_tx.send_replace(false);
        stop_capture.cancel();
        if let Some(capture) = capture {
            match capture.await {
                Ok(capturer) => self.capturer = Some(capturer),
                Err(e) => error!(
                    "Session {}: capture task failed: {}",
                    self.channel.info(),
                    e
                ),
            }
        }

        // 2. close the transport
        halt.cancel();
        drop(inbound);
        if !writer_done {
            match tokio::time::timeout(self.settings.frame_interval, &mut writer).await {
                Ok(Ok(Err(e))) => info!("Session {}: writer ended with {}", self.channel.info(), e),
                Ok(_) => {}
                Err(_) => {
                    warn!(
                        "Session {}: transport close timed out, aborting writer",
                        self.channel.info()
                    );
                    writer.abort();
                }
            }
        }

        ending
    }

    fn on_message(
        &mut self,
        message: Option<Result<Message, tungstenite::Error>>,
    ) -> Option<Ending> {
        let inbound = match message {
            Some(Ok(message)) => protocol::classify(message),
            Some(Err(e)) => {
                let reason = SessionError::Transport(e);
                self.channel.fail(&reason);
                return Some(Ending::Failed(reason));
            }
            None => Inbound::PeerClosed,
        };

        if matches!(inbound, Inbound::Malformed(_)) {
            self.health.record_malformed();
        }

        match self.channel.on_inbound(inbound) {
            Action::Ignore => None,
            Action::Display(frame) => {
                self.health.record_annotated();
                self.display.present(frame);
                None
            }
            Action::Finalize(event) => Some(Ending::Scored(event)),
            Action::Fail(reason) => Some(Ending::Failed(reason)),
        }
    }
}

/// Capture task: ticks the device and offers each frame to flow control.
///
/// Runs on its own so a slow device and a busy inbound stream never hold each
/// other up. Hands the stopped capturer back for release.
async fn capture_loop<S: FrameSource>(
    mut capturer: Capturer<S>,
    flow: FlowController,
    open: watch::Receiver<bool>,
    stop: CancellationToken,
) -> Capturer<S> {
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            frame = capturer.next_frame() => {
                if let Some(frame) = frame {
                    let channel_open = *open.borrow();
                    flow.offer(channel_open, frame);
                }
            }
        }
    }
    capturer.stop();
    capturer
}
