use beacon_core::ParticipantId;

/// What a participant session reports back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Registry broadcast: rooms currently available.
    RoomList(Vec<String>),

    /// Registry broadcast: who is in our room, in join order.
    CurrentUsers(Vec<ParticipantId>),

    /// Media with this peer is live.
    PeerConnected(ParticipantId),

    /// The peer left, disconnected, or was torn down.
    PeerLeft(ParticipantId),

    /// Two consecutive offer/answer rounds with this peer failed. The
    /// session stays in negotiation; the caller may force it closed by
    /// leaving.
    NegotiationFailed { peer: ParticipantId, reason: String },

    /// The session sat in negotiation past its deadline and was closed.
    NegotiationTimedOut(ParticipantId),

    /// Local media capture was refused; this session cannot negotiate.
    MediaDenied(String),
}
