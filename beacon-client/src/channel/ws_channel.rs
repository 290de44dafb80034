use anyhow::{Context, Result};
use async_trait::async_trait;
use beacon_core::{Envelope, SignalError};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{info, warn};

/// Bidirectional signaling channel. Sending while the channel is not open
/// fails with `ChannelNotReady`; the caller decides whether to retry or
/// drop. The channel never reconnects on its own.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), SignalError>;

    async fn close(&self);

    fn is_open(&self) -> bool;
}

/// WebSocket-backed channel to the room registry. Performs no protocol
/// interpretation: it serializes outbound envelopes and decodes inbound
/// frames, preserving arrival order.
pub struct WsChannel {
    out_tx: mpsc::UnboundedSender<WsMessage>,
    open: Arc<AtomicBool>,
}

impl WsChannel {
    /// Connect to the signaling endpoint. Inbound envelopes arrive on the
    /// returned receiver; the receiver ends when the socket closes.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<Envelope>)> {
        let (ws_stream, _) = connect_async(url)
            .await
            .context("WebSocket connect failed")?;
        info!("Signaling channel connected: {}", url);

        let (mut sink, mut stream) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();
        let (in_tx, in_rx) = mpsc::channel(256);
        let open = Arc::new(AtomicBool::new(true));

        let writer_open = open.clone();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            writer_open.store(false, Ordering::SeqCst);
        });

        let reader_open = open.clone();
        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    WsMessage::Text(text) => match Envelope::from_json(&text) {
                        Ok(envelope) => {
                            if in_tx.send(envelope).await.is_err() {
                                break;
                            }
                        }
                        Err(SignalError::UnknownMessageType(kind)) => {
                            warn!("Ignoring unknown message type '{}'", kind);
                        }
                        Err(e) => warn!("Invalid envelope on signaling channel: {}", e),
                    },
                    WsMessage::Close(_) => break,
                    _ => {}
                }
            }
            reader_open.store(false, Ordering::SeqCst);
            info!("Signaling channel closed");
        });

        Ok((Self { out_tx, open }, in_rx))
    }
}

#[async_trait]
impl SignalingChannel for WsChannel {
    async fn send(&self, envelope: &Envelope) -> Result<(), SignalError> {
        if !self.is_open() {
            return Err(SignalError::ChannelNotReady);
        }
        let json = envelope.to_json()?;
        self.out_tx
            .send(WsMessage::Text(json.into()))
            .map_err(|_| SignalError::ChannelNotReady)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.out_tx.send(WsMessage::Close(None));
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
