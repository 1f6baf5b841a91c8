//! Stdin/stdout JSON bridge.
//!
//! Reads one `InboundFrame` per line, hands each to the session handler on
//! its own task, and funnels every reply through a single writer task.
//! Stdout carries only protocol frames; diagnostics go to stderr.

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Catalog, ChatId};
use services::{ChoiceButton, ProgressCoordinator, SessionHandler, Transport, TransportError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::wire::{InboundFrame, OutboundFrame};

const OUTBOUND_CAPACITY: usize = 128;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("stdio failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("writer task failed: {0}")]
    Writer(#[from] JoinError),
}

/// `Transport` that queues frames for the writer task.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<OutboundFrame>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new(tx: mpsc::Sender<OutboundFrame>) -> Self {
        Self { tx }
    }

    async fn push(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.tx.send(frame).await.map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.push(OutboundFrame::Text {
            chat_id: chat,
            text: text.to_string(),
        })
        .await
    }

    async fn send_choices(
        &self,
        chat: ChatId,
        text: &str,
        buttons: Vec<ChoiceButton>,
    ) -> Result<(), TransportError> {
        self.push(OutboundFrame::Choices {
            chat_id: chat,
            text: text.to_string(),
            buttons: buttons.into_iter().map(Into::into).collect(),
        })
        .await
    }

    async fn answer_choice(&self, callback_id: &str, text: &str) -> Result<(), TransportError> {
        self.push(OutboundFrame::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.to_string(),
        })
        .await
    }
}

/// Serve events from `input` until EOF, then wait for in-flight events and
/// the writer to drain. Returns the output sink.
pub async fn run<R, W>(
    input: R,
    output: W,
    catalog: Arc<Catalog>,
    progress: Arc<ProgressCoordinator>,
) -> Result<W, BridgeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer = tokio::spawn(write_frames(rx, output));

    let handler = SessionHandler::new(catalog, progress, Arc::new(ChannelTransport::new(tx)));
    let mut in_flight = JoinSet::new();
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let trimmed = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(error = %e, bytes = buf.len(), "skipping inbound line that is not UTF-8");
                continue;
            }
        };
        if trimmed.is_empty() {
            continue;
        }

        let frame: InboundFrame = match serde_json::from_str(trimmed) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, raw_line = %trimmed, "skipping unparsable inbound frame");
                continue;
            }
        };

        let handler = handler.clone();
        in_flight.spawn(async move { handler.handle(frame.into()).await });

        while let Some(done) = in_flight.try_join_next() {
            log_join(done);
        }
    }

    info!(pending = in_flight.len(), "stdin closed; draining in-flight events");
    while let Some(done) = in_flight.join_next().await {
        log_join(done);
    }

    // Last sender goes with the handler; the writer then sees the channel close.
    drop(handler);
    writer.await?
}

async fn write_frames<W>(mut rx: mpsc::Receiver<OutboundFrame>, output: W) -> Result<W, BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let mut out = BufWriter::new(output);
    while let Some(frame) = rx.recv().await {
        let json = serde_json::to_string(&frame)?;
        out.write_all(json.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        debug!(bytes = json.len(), "frame written");
    }
    Ok(out.into_inner())
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "event task failed");
    }
}
