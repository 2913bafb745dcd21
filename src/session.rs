/// Room session: the one room this client is in, its channel, transcript and
/// shared cart.
///
/// The session owns the username and room membership in memory. They are
/// loaded from the local store once, and every change is written through,
/// so nothing else needs to read storage to learn the current room.

use std::future;

use crate::api::RoomService;
use crate::cart::Cart;
use crate::chat::Transcript;
use crate::error::{ClientError, Result};
use crate::models::{ChatMessage, InboundEvent, Membership, OutboundEvent, RoomCode, RoomState};
use crate::storage::LocalStore;
use crate::websocket::{ChannelConnector, RealtimeChannel};

/// Result of `end_room`. The local leave always happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// The room service terminated the room for everyone
    Terminated(RoomCode),
    /// Termination failed; this client left anyway
    LeftWithoutTermination { room_code: RoomCode, reason: String },
}

/// What an inbound event changed
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Message(ChatMessage),
    /// Relay of a message this client already shows
    EchoSuppressed,
    MemberJoined(String),
    MemberLeft(String),
    /// The host ended the room; the session has left it
    RoomEnded(RoomCode),
    /// Not relevant to the current room
    Ignored,
}

pub(crate) fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ClientError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    Ok(username.to_string())
}

pub struct RoomSession<S: RoomService, C: ChannelConnector> {
    service: S,
    connector: C,
    store: LocalStore,
    username: Option<String>,
    state: RoomState,
    channel: Option<C::Channel>,
    transcript: Transcript,
    shared_cart: Cart,
}

impl<S: RoomService, C: ChannelConnector> RoomSession<S, C> {
    /// Create a session, restoring the username saved by a previous run.
    /// A persisted room is not rejoined until `resume_room` is called.
    pub fn new(service: S, connector: C, store: LocalStore) -> Result<Self> {
        let username = store.username()?;
        Ok(Self {
            service,
            connector,
            store,
            username,
            state: RoomState::NoRoom,
            channel: None,
            transcript: Transcript::new(),
            shared_cart: Cart::new(),
        })
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.state.membership()
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.membership().map(|m| &m.room_code)
    }

    pub fn is_in_room(&self) -> bool {
        self.state.is_in_room()
    }

    pub fn is_host(&self) -> bool {
        self.membership().is_some_and(|m| m.is_host)
    }

    pub fn members(&self) -> &[String] {
        self.membership().map(|m| m.members.as_slice()).unwrap_or(&[])
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn shared_cart(&self) -> &Cart {
        &self.shared_cart
    }

    pub fn shared_cart_mut(&mut self) -> &mut Cart {
        &mut self.shared_cart
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Set and persist the username
    pub fn login(&mut self, username: &str) -> Result<()> {
        if let Some(code) = self.room_code() {
            return Err(ClientError::AlreadyInRoom(code.to_string()));
        }
        let username = validate_username(username)?;
        self.store.set_username(&username)?;
        log::info!("Logged in as {}", username);
        self.username = Some(username);
        Ok(())
    }

    fn ensure_no_room(&self) -> Result<()> {
        match self.room_code() {
            Some(code) => Err(ClientError::AlreadyInRoom(code.to_string())),
            None => Ok(()),
        }
    }

    /// Create a room hosted by `username` and enter it.
    ///
    /// # Errors
    /// * `ValidationError` for a blank username, before any network call
    /// * `AlreadyInRoom` if this client is in a room
    /// * Room service or channel errors; the session stays out of any room
    pub async fn create_room(&mut self, username: &str) -> Result<RoomCode> {
        self.ensure_no_room()?;
        let username = validate_username(username)?;

        self.state = RoomState::Creating;
        let room_code = match self.service.create_room(&username).await {
            Ok(code) => code,
            Err(e) => {
                log::error!("Failed to create room: {}", e);
                self.state = RoomState::NoRoom;
                return Err(e);
            }
        };

        if let Err(e) = self.store.set_username(&username) {
            self.state = RoomState::NoRoom;
            return Err(e);
        }
        self.username = Some(username.clone());

        self.enter_room(room_code.clone(), &username, true).await?;
        log::info!("Created room {} as host {}", room_code, username);
        Ok(room_code)
    }

    /// Join an existing room by code.
    ///
    /// # Errors
    /// * `NotLoggedIn` if no username has been set
    /// * `ValidationError` for a blank room code
    /// * `InvalidRoom` for any lookup or connection failure
    pub async fn join_room(&mut self, room_code: &str) -> Result<RoomCode> {
        self.ensure_no_room()?;
        let username = self.username.clone().ok_or(ClientError::NotLoggedIn)?;
        let room_code = RoomCode::parse(room_code)?;

        self.state = RoomState::Joining(room_code.clone());
        let result = match self.service.lookup_room(&room_code).await {
            Ok(_) => self.enter_room(room_code.clone(), &username, false).await,
            Err(e) => {
                self.state = RoomState::NoRoom;
                Err(e)
            }
        };

        match result {
            Ok(()) => {
                log::info!("Joined room {} as {}", room_code, username);
                Ok(room_code)
            }
            Err(ClientError::InvalidRoom(reason)) => Err(ClientError::InvalidRoom(reason)),
            Err(e) => {
                log::error!("Failed to join room {}: {}", room_code, e);
                Err(ClientError::InvalidRoom(format!("{} ({})", room_code, e)))
            }
        }
    }

    /// Rejoin the room persisted by a previous run, if any. A room the
    /// service no longer knows is forgotten.
    pub async fn resume_room(&mut self) -> Result<Option<RoomCode>> {
        if self.is_in_room() {
            return Ok(self.room_code().cloned());
        }
        let Some(room_code) = self.store.room_code()? else {
            return Ok(None);
        };
        let Some(username) = self.username.clone() else {
            self.store.clear_room()?;
            return Ok(None);
        };
        let is_host = self.store.is_host()?;

        self.state = RoomState::Joining(room_code.clone());
        match self.service.lookup_room(&room_code).await {
            Ok(_) => {}
            Err(ClientError::InvalidRoom(_)) => {
                log::warn!("Persisted room {} no longer exists", room_code);
                self.state = RoomState::NoRoom;
                self.store.clear_room()?;
                return Ok(None);
            }
            Err(e) => {
                self.state = RoomState::NoRoom;
                return Err(e);
            }
        }

        self.enter_room(room_code.clone(), &username, is_host).await?;
        log::info!("Resumed room {}", room_code);
        Ok(Some(room_code))
    }

    /// Open the channel, announce membership, then persist. On failure the
    /// channel is closed and the session is back in `NoRoom`.
    async fn enter_room(&mut self, room_code: RoomCode, username: &str, is_host: bool) -> Result<()> {
        let mut channel = match self.connector.connect().await {
            Ok(channel) => channel,
            Err(e) => {
                self.state = RoomState::NoRoom;
                return Err(e);
            }
        };

        let join = OutboundEvent::JoinRoom {
            room_code: room_code.clone(),
            username: username.to_string(),
        };
        let entered = match channel.emit(&join).await {
            Ok(()) => self.store.set_room(&room_code, is_host),
            Err(e) => Err(e),
        };
        if let Err(e) = entered {
            channel.close().await;
            self.state = RoomState::NoRoom;
            return Err(e);
        }

        self.channel = Some(channel);
        self.transcript.clear();
        self.state = RoomState::InRoom(Membership::new(room_code, username, is_host));
        Ok(())
    }

    /// Leave the current room. Always succeeds locally; channel and storage
    /// failures are logged. Returns the room that was left.
    pub async fn leave_room(&mut self) -> Option<RoomCode> {
        let previous = std::mem::replace(&mut self.state, RoomState::Leaving);
        let membership = match previous {
            RoomState::InRoom(membership) => Some(membership),
            _ => None,
        };
        self.depart(membership).await
    }

    async fn depart(&mut self, membership: Option<Membership>) -> Option<RoomCode> {
        if let Some(mut channel) = self.channel.take() {
            if let (Some(membership), Some(username)) = (&membership, &self.username) {
                let leave = OutboundEvent::LeaveRoom {
                    room_code: membership.room_code.clone(),
                    username: username.clone(),
                };
                if let Err(e) = channel.emit(&leave).await {
                    log::warn!("Failed to announce leave: {}", e);
                }
            }
            channel.close().await;
        }

        if let Err(e) = self.store.clear_room() {
            log::error!("Failed to clear persisted room: {}", e);
        }
        self.shared_cart.clear();
        self.transcript.clear();
        self.state = RoomState::NoRoom;

        let room_code = membership.map(|m| m.room_code);
        if let Some(code) = &room_code {
            log::info!("Left room {}", code);
        }
        room_code
    }

    /// End the room for everyone (host only), then leave it.
    ///
    /// Termination is best effort: a failed request is logged and reported
    /// in the outcome, and the local leave happens either way.
    pub async fn end_room(&mut self) -> Result<EndOutcome> {
        let membership = match &self.state {
            RoomState::InRoom(membership) if membership.is_host => membership.clone(),
            RoomState::InRoom(membership) => {
                return Err(ClientError::NotHost(membership.room_code.to_string()))
            }
            _ => return Err(ClientError::NotInRoom),
        };
        let room_code = membership.room_code.clone();

        self.state = RoomState::Ending;
        let outcome = match self.service.end_room(&room_code).await {
            Ok(()) => {
                if let Some(channel) = &self.channel {
                    if let Err(e) = channel.emit(&OutboundEvent::EndRoom(room_code.clone())).await {
                        log::warn!("Failed to announce room end: {}", e);
                    }
                }
                EndOutcome::Terminated(room_code)
            }
            Err(e) => {
                log::error!("Failed to end room {}: {}", room_code, e);
                EndOutcome::LeftWithoutTermination {
                    room_code,
                    reason: e.to_string(),
                }
            }
        };

        self.depart(Some(membership)).await;
        Ok(outcome)
    }

    /// Send a chat message. It is added to the transcript right away; a
    /// failed emit is logged and not retried.
    pub async fn send_message(&mut self, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }
        let sender = self.require_sender()?;
        self.send(ChatMessage::text(&sender, text)).await
    }

    /// Send a quick reaction (one emoji) to the room chat
    pub async fn send_reaction(&mut self, emoji: &str) -> Result<ChatMessage> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ClientError::ValidationError(
                "Reaction cannot be empty".to_string(),
            ));
        }
        let sender = self.require_sender()?;
        self.send(ChatMessage::reaction(&sender, emoji)).await
    }

    fn require_sender(&self) -> Result<String> {
        if !self.is_in_room() {
            return Err(ClientError::NotInRoom);
        }
        self.username.clone().ok_or(ClientError::NotLoggedIn)
    }

    async fn send(&mut self, message: ChatMessage) -> Result<ChatMessage> {
        let room_code = self.room_code().cloned().ok_or(ClientError::NotInRoom)?;
        self.transcript.push_local(message.clone());

        let event = OutboundEvent::SendMessage {
            room_code,
            message: message.clone(),
        };
        match &self.channel {
            Some(channel) => {
                if let Err(e) = channel.emit(&event).await {
                    log::warn!("Message not delivered: {}", e);
                }
            }
            None => log::warn!("No channel open, message kept locally"),
        }
        Ok(message)
    }

    /// Wait for the next inbound event. Never resolves while no channel is
    /// open; `None` means the channel closed and has been dropped.
    pub async fn next_event(&mut self) -> Option<InboundEvent> {
        let Some(channel) = self.channel.as_mut() else {
            return future::pending().await;
        };
        let event = channel.next_event().await;
        if event.is_none() {
            log::warn!("Room channel closed");
            self.channel = None;
        }
        event
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Apply an inbound event to the session
    pub async fn handle_event(&mut self, event: InboundEvent) -> SessionUpdate {
        let RoomState::InRoom(membership) = &mut self.state else {
            return SessionUpdate::Ignored;
        };

        match event {
            InboundEvent::ReceiveMessage(message) => {
                if self.transcript.push_remote(message.clone()) {
                    SessionUpdate::Message(message)
                } else {
                    log::debug!("Dropped echo of own message");
                    SessionUpdate::EchoSuppressed
                }
            }
            InboundEvent::UserJoined { username } => {
                if membership.add_member(&username) {
                    SessionUpdate::MemberJoined(username)
                } else {
                    SessionUpdate::Ignored
                }
            }
            InboundEvent::UserLeft { username } => {
                if membership.remove_member(&username) {
                    SessionUpdate::MemberLeft(username)
                } else {
                    SessionUpdate::Ignored
                }
            }
            InboundEvent::RoomEnded(room_code) => {
                if membership.room_code != room_code {
                    return SessionUpdate::Ignored;
                }
                log::info!("Room {} was ended by the host", room_code);
                self.leave_room().await;
                SessionUpdate::RoomEnded(room_code)
            }
        }
    }
}
