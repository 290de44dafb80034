use crate::model::{ContentType, ParticipantId, SignalError};
use serde::{Deserialize, Serialize};

/// Session description payload carried by `offer`/`answer` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// ICE candidate payload. Field names follow the candidate's own JSON
/// representation so a relayed candidate round-trips untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// One signaling exchange. Everything crossing the wire is one of these;
/// each envelope is consumed once and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Envelope {
    Create {
        room: String,
        user_id: ParticipantId,
        content_type: ContentType,
    },
    Join {
        room: String,
        user_id: ParticipantId,
        content_type: ContentType,
    },
    Offer {
        offer: SessionDescription,
        room: String,
        user_id: ParticipantId,
    },
    Answer {
        answer: SessionDescription,
        room: String,
        user_id: ParticipantId,
    },
    Candidate {
        candidate: IceCandidate,
        room: String,
        user_id: ParticipantId,
    },
    RoomList {
        rooms: Vec<String>,
    },
    CurrentUsers {
        users: Vec<ParticipantId>,
    },
    ParticipantLeft {
        id: ParticipantId,
    },
}

const KNOWN_KINDS: [&str; 8] = [
    "create",
    "join",
    "offer",
    "answer",
    "candidate",
    "roomList",
    "currentUsers",
    "participantLeft",
];

impl Envelope {
    pub fn to_json(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one wire frame. An unrecognized `type` is reported as
    /// `UnknownMessageType` so receivers can log and move on; anything
    /// else malformed is a `Json` error.
    pub fn from_json(raw: &str) -> Result<Self, SignalError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        if let Some(kind) = value.get("type").and_then(serde_json::Value::as_str)
            && !KNOWN_KINDS.contains(&kind)
        {
            return Err(SignalError::UnknownMessageType(kind.to_owned()));
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Create { .. } => "create",
            Envelope::Join { .. } => "join",
            Envelope::Offer { .. } => "offer",
            Envelope::Answer { .. } => "answer",
            Envelope::Candidate { .. } => "candidate",
            Envelope::RoomList { .. } => "roomList",
            Envelope::CurrentUsers { .. } => "currentUsers",
            Envelope::ParticipantLeft { .. } => "participantLeft",
        }
    }
}
