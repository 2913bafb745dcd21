/// Room chat transcript.
///
/// Messages are kept in arrival order. Messages this client sends are
/// appended as soon as they are sent; when the room service relays one of
/// them back, the copy is recognized by its id and dropped.

use std::collections::VecDeque;

use crate::models::{ChatMessage, MessageId};

/// How many sent ids are remembered for echo detection
const RECENT_SENT_CAPACITY: usize = 128;

#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    recent_sent: VecDeque<MessageId>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message sent by this client
    pub fn push_local(&mut self, message: ChatMessage) {
        if let Some(id) = message.id {
            if self.recent_sent.len() == RECENT_SENT_CAPACITY {
                self.recent_sent.pop_front();
            }
            self.recent_sent.push_back(id);
        }
        self.messages.push(message);
    }

    /// Append a relayed message. Returns false if it was an echo of one of
    /// our own and was dropped.
    pub fn push_remote(&mut self, message: ChatMessage) -> bool {
        if let Some(id) = message.id {
            if let Some(pos) = self.recent_sent.iter().position(|sent| *sent == id) {
                self.recent_sent.remove(pos);
                return false;
            }
        }
        self.messages.push(message);
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.recent_sent.clear();
    }
}
