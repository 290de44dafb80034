use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use beacon_core::{ContentType, IceCandidate, ParticipantId, SessionDescription, SignalError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A local media track ready to be attached to a transport.
#[derive(Clone)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
    pub local: Arc<dyn TrackLocal + Send + Sync>,
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The opaque peer-to-peer media transport capability. One instance per
/// negotiation session; internals (ICE/DTLS/SRTP) are not this crate's
/// business.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn add_track(&self, track: MediaTrack) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds one transport per remote peer, wired to push its events into the
/// participant's event loop.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn open(
        &self,
        remote: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>>;
}

/// Local capture capability. Denial is terminal for the session that
/// requested it.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn capture(&self, content_type: ContentType) -> Result<Vec<MediaTrack>, SignalError>;
}
