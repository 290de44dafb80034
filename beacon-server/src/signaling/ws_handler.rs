use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{Envelope, ParticipantId, SignalError};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let participant = ParticipantId::from(user_id);

    ws.on_upgrade(move |socket| handle_socket(socket, participant, state))
}

async fn handle_socket(socket: WebSocket, participant: ParticipantId, state: Arc<AppState>) {
    info!("New WebSocket connection: {}", participant);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.service.add_peer(participant.clone(), tx);

    // Room discovery snapshot for the newcomer.
    state.service.send_envelope(
        &participant,
        &Envelope::RoomList {
            rooms: state.registry.room_list(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let participant = participant.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => handle_frame(&state, &participant, &text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Either exit path means the participant is gone.
    state.registry.leave(&participant);
    state.service.remove_peer(&participant);
    info!("WebSocket disconnected: {}", participant);
}

fn handle_frame(state: &AppState, participant: &ParticipantId, text: &str) {
    match Envelope::from_json(text) {
        Ok(envelope) => match &envelope {
            Envelope::Create {
                room, content_type, ..
            } => {
                if let Err(e) = state
                    .registry
                    .create_room(room, participant.clone(), *content_type)
                {
                    warn!("create from {} rejected: {}", participant, e);
                }
            }
            Envelope::Join {
                room, content_type, ..
            } => {
                if let Err(e) = state
                    .registry
                    .join_room(room, participant.clone(), *content_type)
                {
                    warn!("join from {} rejected: {}", participant, e);
                }
            }
            Envelope::Offer { room, .. }
            | Envelope::Answer { room, .. }
            | Envelope::Candidate { room, .. } => {
                if let Err(e) = state.registry.relay(room, participant, &envelope) {
                    warn!(
                        "relay of {} from {} failed: {}",
                        envelope.kind(),
                        participant,
                        e
                    );
                }
            }
            other => {
                warn!("Unexpected {} envelope from client {}", other.kind(), participant);
            }
        },
        Err(SignalError::UnknownMessageType(kind)) => {
            warn!("Unknown message type '{}' from {}", kind, participant);
        }
        Err(e) => warn!("Invalid envelope from {}: {}", participant, e),
    }
}
