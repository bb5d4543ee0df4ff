//! Transport writer task
//!
//! Owns the write half of the websocket. Drains the outbound queue one
//! message at a time and flags readiness back to the flow controller once the
//! transport has accepted each message.

use async_tungstenite::tungstenite::{self, Message};
use futures_util::{Sink, SinkExt};
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::session::error::SessionError;
use crate::session::flow::{Outbound, OutboundQueue};

pub async fn write_loop<S>(
    mut sink: S,
    mut queue: OutboundQueue,
    halt: CancellationToken,
) -> Result<(), SessionError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut written = 0u64;

    loop {
        let outbound = tokio::select! {
            biased;
            _ = halt.cancelled() => break,
            outbound = queue.recv() => match outbound {
                Some(outbound) => outbound,
                None => break,
            },
        };

        // a frame may still sit in the queue when the session ends
        if halt.is_cancelled() && matches!(outbound, Outbound::Frame(_)) {
            break;
        }

        let message = match &outbound {
            Outbound::Handshake(text) => Message::text(text.clone()),
            Outbound::Frame(frame) => Message::binary(frame.data.clone()),
        };
        sink.send(message).await?;
        queue.mark_sent(&outbound);
        written += 1;
    }

    debug!("Transport writer: closing after {} messages", written);
    match sink.close().await {
        Ok(()) | Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {}
        Err(e) => info!("Transport writer: close handshake failed: {}", e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::flow::FlowController;
    use crate::session::health::SessionHealth;
    use crate::session::types::Frame;
    use bytes::Bytes;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Sink that records every written message
    fn sink() -> (
        impl Sink<Message, Error = tungstenite::Error> + Unpin,
        mpsc::UnboundedReceiver<Message>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        let sink = futures_util::sink::unfold(tx, |tx, message: Message| async move {
            tx.send(message)
                .map_err(|_| tungstenite::Error::ConnectionClosed)?;
            Ok::<_, tungstenite::Error>(tx)
        });
        (Box::pin(sink), rx)
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<Message>) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        messages
    }

    #[tokio::test]
    async fn test_handshake_written_first() {
        let health = Arc::new(SessionHealth::new());
        let (flow, queue) = FlowController::new(Arc::clone(&health));
        let (sink, rx) = sink();
        let halt = CancellationToken::new();
        let writer = tokio::spawn(write_loop(sink, queue, halt.clone()));

        flow.send_handshake("{\"exercise_id\":7}".into()).await.unwrap();
        while !flow.is_ready() {
            tokio::task::yield_now().await;
        }
        flow.offer(true, Frame::new(Bytes::from_static(b"frame"), 1));
        while !flow.is_ready() {
            tokio::task::yield_now().await;
        }

        drop(flow);
        writer.await.unwrap().unwrap();

        let written = drain(rx).await;
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], Message::text("{\"exercise_id\":7}"));
        assert_eq!(written[1], Message::binary(Bytes::from_static(b"frame")));
        assert_eq!(health.frames_sent(), 1);
    }

    #[tokio::test]
    async fn test_halt_discards_queued_frame() {
        let health = Arc::new(SessionHealth::new());
        let (flow, queue) = FlowController::new(Arc::clone(&health));
        let (sink, rx) = sink();
        let halt = CancellationToken::new();

        // queue a frame before the writer ever runs, then halt
        flow.offer(true, Frame::new(Bytes::from_static(b"late"), 1));
        halt.cancel();

        write_loop(sink, queue, halt).await.unwrap();
        drop(flow);

        let written = drain(rx).await;
        assert!(written.is_empty());
        assert_eq!(health.frames_sent(), 0);
    }
}
