use crate::transport::TrackKind;
use beacon_core::{IceCandidate, ParticipantId};

/// Events a media transport pushes into the participant's event loop.
/// Each event names the remote peer its session belongs to.
#[derive(Debug)]
pub enum TransportEvent {
    /// The transport wants an offer/answer round. Sole trigger for
    /// creating a local offer; fires only after local tracks attach.
    NegotiationNeeded(ParticipantId),

    /// Trickle ICE: a local candidate is ready to send to the remote peer.
    CandidateGenerated(ParticipantId, IceCandidate),

    /// Remote media arrived; the session is live.
    TrackReceived(ParticipantId, RemoteTrackInfo),

    /// The underlying connection failed or closed.
    Disconnected(ParticipantId),
}

#[derive(Debug, Clone)]
pub struct RemoteTrackInfo {
    pub id: String,
    pub kind: TrackKind,
}
