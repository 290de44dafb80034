use beacon_core::ContentType;

/// Commands the application feeds into a participant's event loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Create a room and wait for peers in it.
    CreateRoom {
        room: String,
        content_type: ContentType,
    },

    /// Join an existing room.
    JoinRoom {
        room: String,
        content_type: ContentType,
    },

    /// Leave the current room: tears down every negotiation session and
    /// closes the signaling channel.
    Leave,

    /// Stop the event loop entirely.
    Shutdown,
}
