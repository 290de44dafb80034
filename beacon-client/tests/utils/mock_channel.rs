use async_trait::async_trait;
use beacon_client::SignalingChannel;
use beacon_core::{Envelope, SignalError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory signaling channel that records everything the session sends.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<Envelope>>>,
    open: Arc<AtomicBool>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            open: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of_kind(&self, kind: &str) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    /// Poll until the session has sent an envelope of `kind`.
    pub async fn wait_for_kind(&self, kind: &str, timeout_ms: u64) -> Envelope {
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(timeout_ms);
        loop {
            if let Some(envelope) = self.sent_of_kind(kind).into_iter().next_back() {
                return envelope;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("timed out waiting for an outbound {kind}; sent: {:?}", self.sent());
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
    }

}

#[async_trait]
impl SignalingChannel for MockChannel {
    async fn send(&self, envelope: &Envelope) -> Result<(), SignalError> {
        if !self.is_open() {
            return Err(SignalError::ChannelNotReady);
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
