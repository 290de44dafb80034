mod envelope;
mod error;
mod participant;
mod room;

pub use envelope::{Envelope, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
pub use error::SignalError;
pub use participant::ParticipantId;
pub use room::ContentType;
