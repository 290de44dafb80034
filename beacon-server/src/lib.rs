mod registry;
mod signaling;

pub use registry::*;
pub use signaling::*;

/// Shared state handed to the axum router.
pub struct AppState {
    pub service: SignalingService,
    pub registry: std::sync::Arc<RoomRegistry>,
}
