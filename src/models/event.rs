/// Real-time channel events.
///
/// Each event travels as one JSON text frame: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use super::{ChatMessage, RoomCode};

/// Events this client emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_code: RoomCode, username: String },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_code: RoomCode, username: String },
    EndRoom(RoomCode),
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_code: RoomCode,
        message: ChatMessage,
    },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinRoom { .. } => "join-room",
            OutboundEvent::LeaveRoom { .. } => "leave-room",
            OutboundEvent::EndRoom(_) => "end-room",
            OutboundEvent::SendMessage { .. } => "send-message",
        }
    }
}

/// Events the room service pushes to this client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum InboundEvent {
    ReceiveMessage(ChatMessage),
    UserJoined { username: String },
    UserLeft { username: String },
    RoomEnded(RoomCode),
}
