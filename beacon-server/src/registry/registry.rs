use crate::registry::room::Room;
use crate::signaling::SignalingOutput;
use beacon_core::{ContentType, Envelope, ParticipantId, SignalError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, info};

/// Authoritative room state. Every mutation of a room's member set happens
/// under that room's map entry and its broadcast is issued before the entry
/// is released, so two concurrent joins cannot both observe a stale member
/// list. Unrelated rooms proceed in parallel.
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    memberships: DashMap<ParticipantId, String>,
    output: Arc<dyn SignalingOutput>,
}

impl RoomRegistry {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            output,
        }
    }

    /// Create a room with `participant` as its sole member.
    pub fn create_room(
        &self,
        room_id: &str,
        participant: ParticipantId,
        content_type: ContentType,
    ) -> Result<(), SignalError> {
        if self.rooms.contains_key(room_id) {
            return Err(SignalError::RoomAlreadyExists(room_id.to_owned()));
        }

        // Участник может состоять только в одной комнате одновременно.
        self.leave(&participant);

        match self.rooms.entry(room_id.to_owned()) {
            Entry::Occupied(_) => Err(SignalError::RoomAlreadyExists(room_id.to_owned())),
            Entry::Vacant(slot) => {
                info!("Creating room '{}' ({}) for {}", room_id, content_type, participant);
                slot.insert(Room::new(room_id, content_type, participant.clone()));
                self.memberships.insert(participant, room_id.to_owned());
                self.broadcast_room_list();
                Ok(())
            }
        }
    }

    /// Add `participant` to an existing room and tell every member who is
    /// in the room now.
    pub fn join_room(
        &self,
        room_id: &str,
        participant: ParticipantId,
        _content_type: ContentType,
    ) -> Result<(), SignalError> {
        if !self.rooms.contains_key(room_id) {
            return Err(SignalError::RoomNotFound(room_id.to_owned()));
        }

        self.leave(&participant);

        {
            let Some(mut room) = self.rooms.get_mut(room_id) else {
                // The room emptied out while we were leaving the old one.
                return Err(SignalError::RoomNotFound(room_id.to_owned()));
            };

            info!("{} joined room '{}'", participant, room_id);
            room.admit(participant.clone());
            self.memberships.insert(participant, room_id.to_owned());

            let update = Envelope::CurrentUsers {
                users: room.members().to_vec(),
            };
            for member in room.members() {
                self.output.deliver(member, &update);
            }
        }

        self.broadcast_room_list();
        Ok(())
    }

    /// Remove `participant` from its room, destroying the room when it
    /// empties. No-op for a participant that is not in any room.
    pub fn leave(&self, participant: &ParticipantId) -> Option<String> {
        let (_, room_id) = self.memberships.remove(participant)?;

        let mut destroyed = false;
        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            if room.evict(participant) {
                info!("{} left room '{}'", participant, room_id);
            }
            if room.is_empty() {
                destroyed = true;
            } else {
                let update = Envelope::ParticipantLeft {
                    id: participant.clone(),
                };
                for member in room.members() {
                    self.output.deliver(member, &update);
                }
            }
        }

        if destroyed {
            // Recheck emptiness: a join may have raced in after the guard
            // above was released.
            if self
                .rooms
                .remove_if(&room_id, |_, room| room.is_empty())
                .is_some()
            {
                info!("Room '{}' is empty, destroying it", room_id);
                self.broadcast_room_list();
            }
        }

        Some(room_id)
    }

    /// Forward an `offer`/`answer`/`candidate` envelope to every member of
    /// the room except its sender.
    pub fn relay(
        &self,
        room_id: &str,
        sender: &ParticipantId,
        envelope: &Envelope,
    ) -> Result<(), SignalError> {
        let Some(room) = self.rooms.get(room_id) else {
            return Err(SignalError::RoomNotFound(room_id.to_owned()));
        };

        debug!("Relaying {} from {} in room '{}'", envelope.kind(), sender, room_id);
        for member in room.members().iter().filter(|m| *m != sender) {
            self.output.deliver(member, envelope);
        }
        Ok(())
    }

    /// Snapshot of room ids, sorted for stable broadcasts.
    pub fn room_list(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.rooms.iter().map(|e| e.key().clone()).collect();
        rooms.sort();
        rooms
    }

    pub fn members_of(&self, room_id: &str) -> Option<Vec<ParticipantId>> {
        self.rooms.get(room_id).map(|r| r.members().to_vec())
    }

    fn broadcast_room_list(&self) {
        let update = Envelope::RoomList {
            rooms: self.room_list(),
        };
        self.output.broadcast(&update);
    }
}
