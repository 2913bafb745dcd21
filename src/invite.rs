/// Room invitations: the shareable link and the invite email list.

use crate::error::{ClientError, Result};
use crate::models::RoomCode;

const ROOM_LINK_BASE: &str = "https://coshop.app/room/";

pub const DEFAULT_INVITE_MESSAGE: &str =
    "Hey! Join me for a shopping session. Let's find some great deals together!";

pub fn room_link(room_code: &RoomCode) -> String {
    format!("{}{}", ROOM_LINK_BASE, room_code)
}

/// Split a comma-separated list, dropping blanks
pub fn parse_emails(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub link: String,
    pub recipients: Vec<String>,
    pub message: String,
}

impl Invitation {
    pub fn new(room_code: &RoomCode, emails: &str) -> Result<Self> {
        let recipients = parse_emails(emails);
        if let Some(bad) = recipients.iter().find(|email| !email.contains('@')) {
            return Err(ClientError::ValidationError(format!(
                "Not an email address: {}",
                bad
            )));
        }
        Ok(Invitation {
            link: room_link(room_code),
            recipients,
            message: DEFAULT_INVITE_MESSAGE.to_string(),
        })
    }

    /// Share text used when there are no recipients
    pub fn share_text(&self) -> String {
        format!("Join my shopping session on CoShop! {}", self.link)
    }
}
