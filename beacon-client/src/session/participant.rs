use crate::channel::SignalingChannel;
use crate::session::{NegotiationSession, SessionCommand, SessionEvent};
use crate::transport::{MediaSource, MediaTrack, TransportEvent, TransportFactory};
use beacon_core::{ContentType, Envelope, ParticipantId, SessionDescription, SignalError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SessionConfig {
    /// How long a session may sit in `Negotiating` before it is closed
    /// with a timeout.
    pub negotiation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Duration::from_secs(30),
        }
    }
}

enum MediaState {
    NotRequested,
    Ready(Vec<MediaTrack>),
    Denied,
}

struct RoomHandle {
    id: String,
}

/// One participant's signaling session: a single-threaded event loop that
/// owns every `NegotiationSession` this participant holds, consumes
/// channel envelopes and transport events in arrival order, and emits the
/// envelopes negotiation produces. At most one state transition is ever in
/// flight per session.
pub struct ParticipantSession {
    id: ParticipantId,
    channel: Arc<dyn SignalingChannel>,
    inbound_rx: mpsc::Receiver<Envelope>,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    transport_factory: Arc<dyn TransportFactory>,
    media_source: Arc<dyn MediaSource>,
    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    config: SessionConfig,
    room: Option<RoomHandle>,
    media: MediaState,
    sessions: HashMap<ParticipantId, NegotiationSession>,
}

impl ParticipantSession {
    pub fn new(
        id: ParticipantId,
        channel: Arc<dyn SignalingChannel>,
        inbound_rx: mpsc::Receiver<Envelope>,
        transport_factory: Arc<dyn TransportFactory>,
        media_source: Arc<dyn MediaSource>,
        config: SessionConfig,
    ) -> (
        Self,
        mpsc::Sender<SessionCommand>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::channel(256);

        let session = Self {
            id,
            channel,
            inbound_rx,
            command_rx,
            event_tx,
            transport_factory,
            media_source,
            transport_tx,
            transport_rx,
            config,
            room: None,
            media: MediaState::NotRequested,
            sessions: HashMap::new(),
        };

        (session, command_tx, event_rx)
    }

    pub async fn run(mut self) {
        info!("Session event loop started for {}", self.id);

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Shutdown) | None => {
                            self.shutdown().await;
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                    }
                }

                envelope = self.inbound_rx.recv() => {
                    match envelope {
                        Some(e) => self.handle_envelope(e).await,
                        None => {
                            info!("Signaling channel closed for {}", self.id);
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                event = self.transport_rx.recv() => {
                    // transport_tx is held by self, so this arm never yields None
                    if let Some(e) = event {
                        self.handle_transport_event(e).await;
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))),
                    if deadline.is_some() =>
                {
                    self.expire_negotiations().await;
                }
            }
        }

        info!("Session event loop finished for {}", self.id);
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::CreateRoom { room, content_type } => {
                self.enter_room(room, content_type, true).await;
            }
            SessionCommand::JoinRoom { room, content_type } => {
                self.enter_room(room, content_type, false).await;
            }
            SessionCommand::Leave => {
                self.shutdown().await;
            }
            SessionCommand::Shutdown => unreachable!("handled in run()"),
        }
    }

    async fn enter_room(&mut self, room: String, content_type: ContentType, create: bool) {
        if !self.ensure_media(content_type).await {
            return;
        }

        let envelope = if create {
            Envelope::Create {
                room: room.clone(),
                user_id: self.id.clone(),
                content_type,
            }
        } else {
            Envelope::Join {
                room: room.clone(),
                user_id: self.id.clone(),
                content_type,
            }
        };

        if let Err(e) = self.channel.send(&envelope).await {
            warn!("Failed to send {}: {}", envelope.kind(), e);
            return;
        }

        self.room = Some(RoomHandle { id: room });
    }

    /// Capture local media once, before the room is entered. Denial is
    /// terminal: the room is never joined.
    async fn ensure_media(&mut self, content_type: ContentType) -> bool {
        match &self.media {
            MediaState::Ready(_) => true,
            MediaState::Denied => false,
            MediaState::NotRequested => match self.media_source.capture(content_type).await {
                Ok(tracks) => {
                    debug!("Captured {} local track(s)", tracks.len());
                    self.media = MediaState::Ready(tracks);
                    true
                }
                Err(e) => {
                    warn!("Media capture denied for {}: {}", self.id, e);
                    self.media = MediaState::Denied;
                    self.emit(SessionEvent::MediaDenied(e.to_string()));
                    false
                }
            },
        }
    }

    async fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::RoomList { rooms } => {
                self.emit(SessionEvent::RoomList(rooms));
            }

            Envelope::CurrentUsers { users } => {
                self.emit(SessionEvent::CurrentUsers(users.clone()));

                // Two or more participants means it is time to negotiate.
                if users.len() >= 2 {
                    let self_id = self.id.clone();
                    for user in users.into_iter().filter(|u| *u != self_id) {
                        self.ensure_session(&user).await;
                    }
                }
            }

            Envelope::Offer { offer, user_id, .. } => {
                if user_id == self.id {
                    return;
                }
                self.handle_remote_offer(user_id, offer).await;
            }

            Envelope::Answer {
                answer, user_id, ..
            } => {
                let Some(session) = self.sessions.get_mut(&user_id) else {
                    warn!("answer from {} without a session", user_id);
                    return;
                };
                if let Err(e) = session.apply_remote_answer(answer).await {
                    self.negotiation_failure(&user_id, e.to_string());
                }
            }

            Envelope::Candidate {
                candidate, user_id, ..
            } => {
                if user_id == self.id {
                    return;
                }
                // A candidate can legitimately arrive before the offer;
                // make sure there is a session to buffer it in.
                if self.ensure_session(&user_id).await
                    && let Some(session) = self.sessions.get_mut(&user_id)
                {
                    session.add_candidate(candidate).await;
                }
            }

            Envelope::ParticipantLeft { id } => {
                if self.close_session(&id).await {
                    self.emit(SessionEvent::PeerLeft(id));
                }
            }

            other => {
                warn!("Unexpected {} envelope on client channel", other.kind());
            }
        }
    }

    async fn handle_remote_offer(&mut self, remote: ParticipantId, offer: SessionDescription) {
        if !self.ensure_session(&remote).await {
            return;
        }

        let timeout = self.config.negotiation_timeout;
        let Some(session) = self.sessions.get_mut(&remote) else {
            return;
        };
        let outcome = session.apply_remote_offer(offer, timeout).await;

        match outcome {
            Ok(answer) => {
                self.send_to_room(|room, id| Envelope::Answer {
                    answer,
                    room,
                    user_id: id,
                })
                .await;
            }
            Err(e) => self.negotiation_failure(&remote, e.to_string()),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::NegotiationNeeded(remote) => {
                self.handle_negotiation_needed(remote).await;
            }

            TransportEvent::CandidateGenerated(_remote, candidate) => {
                self.send_to_room(|room, id| Envelope::Candidate {
                    candidate,
                    room,
                    user_id: id,
                })
                .await;
            }

            TransportEvent::TrackReceived(remote, _info) => {
                if let Some(session) = self.sessions.get_mut(&remote) {
                    session.mark_connected();
                    self.emit(SessionEvent::PeerConnected(remote));
                }
            }

            TransportEvent::Disconnected(remote) => {
                if self.close_session(&remote).await {
                    self.emit(SessionEvent::PeerLeft(remote));
                }
            }
        }
    }

    async fn handle_negotiation_needed(&mut self, remote: ParticipantId) {
        let timeout = self.config.negotiation_timeout;
        let Some(session) = self.sessions.get_mut(&remote) else {
            debug!("negotiation-needed for unknown session {}", remote);
            return;
        };

        // Offers are gated on local tracks, and a peer that already holds
        // (or answered) the remote's offer never offers back.
        if !session.media_attached() {
            debug!("Gating offer to {}: local media not attached yet", remote);
            return;
        }
        if session.offer_role_taken() {
            debug!("Skipping offer to {}: negotiation already underway", remote);
            return;
        }

        let outcome = session.begin_local_offer(timeout).await;
        match outcome {
            Ok(offer) => {
                self.send_to_room(|room, id| Envelope::Offer {
                    offer,
                    room,
                    user_id: id,
                })
                .await;
            }
            Err(e) => self.negotiation_failure(&remote, e.to_string()),
        }
    }

    /// Open a negotiation session (transport + local tracks) for `remote`
    /// if none exists. Returns whether a usable session exists after the
    /// call.
    async fn ensure_session(&mut self, remote: &ParticipantId) -> bool {
        if self.sessions.contains_key(remote) {
            return true;
        }

        let MediaState::Ready(tracks) = &self.media else {
            warn!("Not negotiating with {}: local media unavailable", remote);
            return false;
        };
        let tracks = tracks.clone();

        let transport = match self
            .transport_factory
            .open(remote.clone(), self.transport_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!("Failed to open transport for {}: {:?}", remote, e);
                return false;
            }
        };

        let mut session = NegotiationSession::new(remote.clone(), transport);
        if let Err(e) = session.attach_media(&tracks).await {
            warn!("Failed to attach local tracks for {}: {:?}", remote, e);
            return false;
        }

        info!("Opened negotiation session with {}", remote);
        self.sessions.insert(remote.clone(), session);
        true
    }

    /// Count a failed round; the second consecutive failure surfaces to
    /// the caller. The session stays in `Negotiating` either way.
    fn negotiation_failure(&mut self, remote: &ParticipantId, reason: String) {
        let Some(session) = self.sessions.get_mut(remote) else {
            return;
        };
        let rounds = session.record_failure();
        let error = SignalError::NegotiationFailed {
            peer: remote.clone(),
            reason: reason.clone(),
        };
        warn!("{} (attempt {})", error, rounds);
        if rounds >= 2 {
            self.emit(SessionEvent::NegotiationFailed {
                peer: remote.clone(),
                reason,
            });
        }
    }

    async fn close_session(&mut self, remote: &ParticipantId) -> bool {
        let Some(mut session) = self.sessions.remove(remote) else {
            return false;
        };
        session.close().await;
        info!("Closed negotiation session with {}", remote);
        true
    }

    async fn expire_negotiations(&mut self) {
        let now = Instant::now();
        let expired: Vec<ParticipantId> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_expired(now))
            .map(|(remote, _)| remote.clone())
            .collect();

        for remote in expired {
            warn!("{}", SignalError::NegotiationTimeout(remote.clone()));
            self.close_session(&remote).await;
            self.emit(SessionEvent::NegotiationTimedOut(remote));
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(|s| s.deadline()).min()
    }

    async fn send_to_room(&self, build: impl FnOnce(String, ParticipantId) -> Envelope) {
        let Some(room) = &self.room else {
            debug!("Dropping outbound envelope: not in a room");
            return;
        };
        let envelope = build(room.id.clone(), self.id.clone());
        if let Err(e) = self.channel.send(&envelope).await {
            warn!("Failed to send {}: {}", envelope.kind(), e);
        }
    }

    async fn shutdown(&mut self) {
        let remotes: Vec<ParticipantId> = self.sessions.keys().cloned().collect();
        for remote in remotes {
            self.close_session(&remote).await;
        }
        self.room = None;
        self.channel.close().await;
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}
