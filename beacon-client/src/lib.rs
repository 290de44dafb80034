pub mod channel;
pub mod session;
pub mod transport;

pub use channel::{SignalingChannel, WsChannel};
pub use session::{
    NegotiationSession, ParticipantSession, SessionCommand, SessionConfig, SessionEvent,
    SessionState,
};
pub use transport::{
    MediaSource, MediaTrack, MediaTransport, RemoteTrackInfo, RtcTransport, RtcTransportFactory,
    TrackKind, TransportConfig, TransportEvent, TransportFactory,
};
