/// Room model: the code a room is known by and the local view of its
/// membership.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Validate user input as a room code
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(ClientError::ValidationError(
                "Room code cannot be empty".to_string(),
            ));
        }
        if code.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(ClientError::ValidationError(format!(
                "Room code contains invalid characters: {}",
                code
            )));
        }
        Ok(RoomCode(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership in the one room this client is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_code: RoomCode,
    /// Asserted locally when this client created the room.
    pub is_host: bool,
    pub members: Vec<String>,
}

impl Membership {
    pub fn new(room_code: RoomCode, username: &str, is_host: bool) -> Self {
        Membership {
            room_code,
            is_host,
            members: vec![username.to_string()],
        }
    }

    /// Returns false if the member was already listed
    pub fn add_member(&mut self, username: &str) -> bool {
        if self.members.iter().any(|m| m == username) {
            return false;
        }
        self.members.push(username.to_string());
        true
    }

    pub fn remove_member(&mut self, username: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != username);
        self.members.len() != before
    }
}

/// Client-observed room lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    NoRoom,
    Creating,
    Joining(RoomCode),
    InRoom(Membership),
    Leaving,
    Ending,
}

impl RoomState {
    pub fn membership(&self) -> Option<&Membership> {
        match self {
            RoomState::InRoom(membership) => Some(membership),
            _ => None,
        }
    }

    pub fn is_in_room(&self) -> bool {
        matches!(self, RoomState::InRoom(_))
    }
}
