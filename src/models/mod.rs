/// Data models for the CoShop client.
/// Defines products, money, chat messages, rooms, orders and the wire DTOs
/// exchanged with the room service.

pub mod event;
pub mod message;
pub mod money;
pub mod order;
pub mod product;
pub mod room;

pub use event::{InboundEvent, OutboundEvent};
pub use message::{ChatMessage, MessageId, MessageKind};
pub use money::Money;
pub use order::{Order, OrderLine, OrderStatus};
pub use product::{Availability, Product, ProductId};
pub use room::{Membership, RoomCode, RoomState};

use serde::{Deserialize, Serialize};

/// Room creation request for the room service
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub username: String,
}

/// Room service reply carrying a room code (create and lookup)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_code: RoomCode,
}

/// Room termination request for the room service
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRoomRequest {
    pub room_code: RoomCode,
}
