use crate::signaling::SignalingOutput;
use axum::extract::ws::Message;
use beacon_core::{Envelope, ParticipantId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
}

/// Maps connected participants to their outbound WebSocket queues and
/// serializes envelopes at the edge.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, peer: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer, tx);
    }

    pub fn remove_peer(&self, peer: &ParticipantId) {
        self.inner.peers.remove(peer);
    }

    pub fn send_envelope(&self, peer: &ParticipantId, envelope: &Envelope) {
        if let Some(tx) = self.inner.peers.get(peer) {
            match envelope.to_json() {
                Ok(json) => {
                    if let Err(e) = tx.send(Message::Text(json.into())) {
                        error!("Failed to queue message for {}: {:?}", peer, e);
                    }
                }
                Err(e) => error!("Failed to serialize {} envelope: {}", envelope.kind(), e),
            }
        } else {
            warn!("Attempted to send {} to disconnected user {}", envelope.kind(), peer);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingOutput for SignalingService {
    fn deliver(&self, peer: &ParticipantId, envelope: &Envelope) {
        self.send_envelope(peer, envelope);
    }

    fn broadcast(&self, envelope: &Envelope) {
        for entry in self.inner.peers.iter() {
            self.send_envelope(entry.key(), envelope);
        }
    }
}
