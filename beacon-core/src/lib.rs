pub mod model;

pub use model::{
    ContentType, Envelope, IceCandidate, IceServerConfig, ParticipantId, SdpKind, SessionDescription,
    SignalError,
};
