use crate::transport::{MediaTrack, MediaTransport};
use anyhow::Result;
use beacon_core::{IceCandidate, ParticipantId, SessionDescription};
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingLocalMedia,
    Negotiating,
    Connected,
    Closed,
}

/// Per-remote-peer negotiation state. Owned exclusively by one
/// participant's event loop; every transition happens on that loop.
pub struct NegotiationSession {
    pub remote: ParticipantId,
    state: SessionState,
    transport: Box<dyn MediaTransport>,
    pending_candidates: Vec<IceCandidate>,
    remote_description_set: bool,
    awaiting_answer: bool,
    media_attached: bool,
    failed_rounds: u8,
    deadline: Option<Instant>,
}

impl NegotiationSession {
    pub fn new(remote: ParticipantId, transport: Box<dyn MediaTransport>) -> Self {
        Self {
            remote,
            state: SessionState::Idle,
            transport,
            pending_candidates: Vec::new(),
            remote_description_set: false,
            awaiting_answer: false,
            media_attached: false,
            failed_rounds: 0,
            deadline: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.state == SessionState::Negotiating
            && self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Attach local tracks. Must complete before any offer/answer work;
    /// the offer trigger is ignored until it has.
    pub async fn attach_media(&mut self, tracks: &[MediaTrack]) -> Result<()> {
        for track in tracks {
            self.transport.add_track(track.clone()).await?;
        }
        self.media_attached = true;
        if self.state == SessionState::Idle {
            self.state = SessionState::AwaitingLocalMedia;
        }
        Ok(())
    }

    pub fn media_attached(&self) -> bool {
        self.media_attached
    }

    /// True when this side should not spontaneously offer: either we
    /// already hold the remote's description or our own offer is in
    /// flight.
    pub fn offer_role_taken(&self) -> bool {
        self.remote_description_set || self.awaiting_answer
    }

    /// Create a local offer and stage it on the transport. Called only
    /// from the negotiation-needed trigger.
    pub async fn begin_local_offer(&mut self, timeout: Duration) -> Result<SessionDescription> {
        let offer = self.transport.create_offer().await?;
        self.transport.set_local_description(offer.clone()).await?;
        self.awaiting_answer = true;
        self.enter_negotiating(timeout);
        Ok(offer)
    }

    /// Apply a remote offer and produce our answer. An outstanding local
    /// offer is abandoned: the remotely-received offer always wins.
    pub async fn apply_remote_offer(
        &mut self,
        offer: SessionDescription,
        timeout: Duration,
    ) -> Result<SessionDescription> {
        if self.awaiting_answer {
            debug!("Abandoning local offer to {}: remote offer wins", self.remote);
            self.awaiting_answer = false;
        }

        self.transport.set_remote_description(offer).await?;
        self.remote_description_set = true;
        self.enter_negotiating(timeout);
        self.flush_candidates().await;

        let answer = self.transport.create_answer().await?;
        self.transport.set_local_description(answer.clone()).await?;
        self.failed_rounds = 0;
        Ok(answer)
    }

    /// Apply the remote answer to our outstanding offer. An answer to an
    /// offer we already abandoned (glare) is stale and dropped.
    pub async fn apply_remote_answer(&mut self, answer: SessionDescription) -> Result<()> {
        if !self.awaiting_answer {
            debug!("Ignoring answer from {}: no offer outstanding", self.remote);
            return Ok(());
        }
        self.transport.set_remote_description(answer).await?;
        self.remote_description_set = true;
        self.awaiting_answer = false;
        self.failed_rounds = 0;
        self.flush_candidates().await;
        Ok(())
    }

    /// Apply a remote candidate now, or buffer it until the remote
    /// description exists. A candidate the transport rejects is skipped.
    pub async fn add_candidate(&mut self, candidate: IceCandidate) {
        if self.remote_description_set {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Failed to add ICE candidate from {}: {:?}", self.remote, e);
            }
        } else {
            self.pending_candidates.push(candidate);
        }
    }

    async fn flush_candidates(&mut self) {
        if self.pending_candidates.is_empty() {
            return;
        }
        debug!(
            "Flushing {} buffered candidates from {}",
            self.pending_candidates.len(),
            self.remote
        );
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("Failed to add ICE candidate from {}: {:?}", self.remote, e);
            }
        }
    }

    /// Count a failed offer/answer round. The session stays in
    /// `Negotiating`; the next fresh round is the retry.
    pub fn record_failure(&mut self) -> u8 {
        self.failed_rounds = self.failed_rounds.saturating_add(1);
        self.failed_rounds
    }

    pub fn mark_connected(&mut self) {
        self.state = SessionState::Connected;
        self.deadline = None;
    }

    /// Release the transport and drop buffered work. Safe to call twice.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.transport.close().await {
            warn!("Error closing transport for {}: {:?}", self.remote, e);
        }
        self.pending_candidates.clear();
        self.awaiting_answer = false;
        self.deadline = None;
        self.state = SessionState::Closed;
    }

    fn enter_negotiating(&mut self, timeout: Duration) {
        if self.state != SessionState::Negotiating && self.state != SessionState::Connected {
            self.state = SessionState::Negotiating;
            self.deadline = Some(Instant::now() + timeout);
        }
    }
}
