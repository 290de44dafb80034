use crate::model::ParticipantId;
use thiserror::Error;

/// Errors that can occur while signaling.
#[derive(Error, Debug)]
pub enum SignalError {
    /// The signaling channel is not open; the caller decides whether to
    /// retry or drop the message.
    #[error("signaling channel is not open")]
    ChannelNotReady,

    /// `create` targeted a room id that is already taken.
    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    /// `join` or a relay targeted a room that does not exist.
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    /// An offer/answer round with a peer failed.
    #[error("negotiation with peer {peer} failed: {reason}")]
    NegotiationFailed { peer: ParticipantId, reason: String },

    /// A session stayed in negotiation past its deadline.
    #[error("negotiation with peer {0} timed out")]
    NegotiationTimeout(ParticipantId),

    /// Local media capture was refused.
    #[error("media access denied: {0}")]
    MediaAccessDenied(String),

    /// An envelope carried a `type` this build does not know. Non-fatal:
    /// logged and ignored by receivers.
    #[error("unknown message type '{0}'")]
    UnknownMessageType(String),

    /// JSON decode/encode error for a known envelope kind.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
