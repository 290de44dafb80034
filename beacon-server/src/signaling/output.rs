use beacon_core::{Envelope, ParticipantId};

/// Трейт, который должна реализовать внешняя система (WebSocket сервер),
/// чтобы реестр комнат мог доставлять конверты клиентам.
///
/// Delivery must not block: the registry calls these while holding a room
/// entry, so implementations queue and return.
pub trait SignalingOutput: Send + Sync {
    /// Доставить конверт конкретному участнику.
    fn deliver(&self, peer: &ParticipantId, envelope: &Envelope);

    /// Разослать конверт всем подключенным участникам.
    fn broadcast(&self, envelope: &Envelope);
}
