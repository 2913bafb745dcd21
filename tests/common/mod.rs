//! Common test utilities and helpers for integration tests
//!
//! Provides in-memory doubles for the room service and the real-time
//! channel, a stub HTTP room service on actix-web, and a WebSocket relay
//! that forwards room events between connected clients.
#![allow(dead_code)]

use actix_web::{dev::ServerHandle, web, App, HttpResponse, HttpServer};
use coshop_client::api::RoomService;
use coshop_client::error::{ClientError, Result};
use coshop_client::models::{InboundEvent, OutboundEvent, RoomCode};
use coshop_client::session::RoomSession;
use coshop_client::storage::LocalStore;
use coshop_client::websocket::{ChannelConnector, RealtimeChannel};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// What a relay delivers for an emitted event
fn translate(event: &OutboundEvent) -> (RoomCode, InboundEvent) {
    match event {
        OutboundEvent::JoinRoom {
            room_code,
            username,
        } => (
            room_code.clone(),
            InboundEvent::UserJoined {
                username: username.clone(),
            },
        ),
        OutboundEvent::LeaveRoom {
            room_code,
            username,
        } => (
            room_code.clone(),
            InboundEvent::UserLeft {
                username: username.clone(),
            },
        ),
        OutboundEvent::EndRoom(room_code) => {
            (room_code.clone(), InboundEvent::RoomEnded(room_code.clone()))
        }
        OutboundEvent::SendMessage { room_code, message } => (
            room_code.clone(),
            InboundEvent::ReceiveMessage(message.clone()),
        ),
    }
}

// ---------------------------------------------------------------------------
// In-memory room service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ServiceState {
    rooms: HashSet<String>,
    next_code: Option<String>,
    created: usize,
    calls: Vec<String>,
    fail_create: bool,
    fail_end: bool,
}

/// Room service double; clones share state so a test can inspect calls
/// after handing one to a session.
#[derive(Clone, Default)]
pub struct InMemoryRoomService {
    state: Arc<Mutex<ServiceState>>,
}

impl InMemoryRoomService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(self, code: &str) -> Self {
        self.state.lock().unwrap().rooms.insert(code.to_string());
        self
    }

    /// Code handed out by the next create
    pub fn set_next_code(&self, code: &str) {
        self.state.lock().unwrap().next_code = Some(code.to_string());
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_end(&self) {
        self.state.lock().unwrap().fail_end = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn has_room(&self, code: &str) -> bool {
        self.state.lock().unwrap().rooms.contains(code)
    }
}

impl RoomService for InMemoryRoomService {
    async fn create_room(&self, username: &str) -> Result<RoomCode> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create:{}", username));
        if state.fail_create {
            return Err(ClientError::ServerError(
                "Room creation failed: 500 Internal Server Error".to_string(),
            ));
        }
        state.created += 1;
        let code = match state.next_code.take() {
            Some(code) => code,
            None => format!("ROOM{:02}", state.created),
        };
        state.rooms.insert(code.clone());
        RoomCode::parse(&code)
    }

    async fn lookup_room(&self, room_code: &RoomCode) -> Result<RoomCode> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("lookup:{}", room_code));
        if state.rooms.contains(room_code.as_str()) {
            Ok(room_code.clone())
        } else {
            Err(ClientError::InvalidRoom(room_code.to_string()))
        }
    }

    async fn end_room(&self, room_code: &RoomCode) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("end:{}", room_code));
        if state.fail_end {
            return Err(ClientError::ServerError(
                "Ending room failed: 503 Service Unavailable".to_string(),
            ));
        }
        state.rooms.remove(room_code.as_str());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loopback real-time channel
// ---------------------------------------------------------------------------

struct LoopbackPeer {
    id: usize,
    room: Option<RoomCode>,
    tx: mpsc::UnboundedSender<InboundEvent>,
}

#[derive(Default)]
struct HubState {
    next_id: usize,
    peers: Vec<LoopbackPeer>,
    emitted: Vec<OutboundEvent>,
    echo_to_sender: bool,
    refuse_connections: bool,
    fail_emits: bool,
}

/// In-process stand-in for the room relay. Every channel opened through one
/// of its connectors sees the others' events.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay chat messages back to their sender as well
    pub fn with_echo() -> Self {
        let hub = Self::default();
        hub.state.lock().unwrap().echo_to_sender = true;
        hub
    }

    pub fn connector(&self) -> LoopbackConnector {
        LoopbackConnector { hub: self.clone() }
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_connections = refuse;
    }

    pub fn fail_emits(&self, fail: bool) {
        self.state.lock().unwrap().fail_emits = fail;
    }

    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.state.lock().unwrap().emitted.clone()
    }

    pub fn emitted_names(&self) -> Vec<&'static str> {
        self.emitted().iter().map(|e| e.name()).collect()
    }

    pub fn open_channels(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }

    /// Deliver an event to every open channel
    pub fn push_to_all(&self, event: InboundEvent) {
        for peer in &self.state.lock().unwrap().peers {
            let _ = peer.tx.send(event.clone());
        }
    }

    /// Drop every channel, as if the relay went away
    pub fn disconnect_all(&self) {
        self.state.lock().unwrap().peers.clear();
    }

    fn register(&self) -> (usize, mpsc::UnboundedReceiver<InboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.peers.push(LoopbackPeer { id, room: None, tx });
        (id, rx)
    }

    fn route(&self, from: usize, event: &OutboundEvent) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_emits || !state.peers.iter().any(|p| p.id == from) {
            return Err(ClientError::WebSocketError("Channel closed".to_string()));
        }
        state.emitted.push(event.clone());

        let (room, inbound) = translate(event);
        let echo = state.echo_to_sender && matches!(event, OutboundEvent::SendMessage { .. });
        for peer in state.peers.iter_mut() {
            if peer.id == from {
                match event {
                    OutboundEvent::JoinRoom { .. } => peer.room = Some(room.clone()),
                    OutboundEvent::LeaveRoom { .. } => peer.room = None,
                    _ => {}
                }
                if echo {
                    let _ = peer.tx.send(inbound.clone());
                }
            } else if peer.room.as_ref() == Some(&room) {
                let _ = peer.tx.send(inbound.clone());
            }
        }
        Ok(())
    }

    fn remove(&self, id: usize) {
        self.state.lock().unwrap().peers.retain(|p| p.id != id);
    }
}

#[derive(Clone)]
pub struct LoopbackConnector {
    hub: LoopbackHub,
}

impl ChannelConnector for LoopbackConnector {
    type Channel = LoopbackChannel;

    async fn connect(&self) -> Result<LoopbackChannel> {
        if self.hub.state.lock().unwrap().refuse_connections {
            return Err(ClientError::WebSocketError("Connection refused".to_string()));
        }
        let (id, rx) = self.hub.register();
        Ok(LoopbackChannel {
            id,
            hub: self.hub.clone(),
            rx,
        })
    }
}

pub struct LoopbackChannel {
    id: usize,
    hub: LoopbackHub,
    rx: mpsc::UnboundedReceiver<InboundEvent>,
}

impl RealtimeChannel for LoopbackChannel {
    async fn emit(&self, event: &OutboundEvent) -> Result<()> {
        self.hub.route(self.id, event)
    }

    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.hub.remove(self.id);
        self.rx.close();
    }
}

pub type TestSession = RoomSession<InMemoryRoomService, LoopbackConnector>;

/// Session over the in-memory doubles with a fresh in-memory store
pub fn test_session(service: &InMemoryRoomService, hub: &LoopbackHub) -> TestSession {
    RoomSession::new(
        service.clone(),
        hub.connector(),
        LocalStore::in_memory().expect("Failed to open in-memory store"),
    )
    .expect("Failed to create session")
}

// ---------------------------------------------------------------------------
// Stub HTTP room service (actix-web)
// ---------------------------------------------------------------------------

pub struct StubState {
    rooms: Mutex<HashSet<String>>,
    next_codes: Mutex<Vec<String>>,
    products: Mutex<(u16, String)>,
    end_status: Mutex<u16>,
    requests: Mutex<Vec<String>>,
}

impl StubState {
    pub fn add_room(&self, code: &str) {
        self.rooms.lock().unwrap().insert(code.to_string());
    }

    pub fn has_room(&self, code: &str) -> bool {
        self.rooms.lock().unwrap().contains(code)
    }

    /// Codes handed out by upcoming creates, in order
    pub fn queue_code(&self, code: &str) {
        self.next_codes.lock().unwrap().push(code.to_string());
    }

    pub fn set_products(&self, status: u16, body: &str) {
        *self.products.lock().unwrap() = (status, body.to_string());
    }

    pub fn set_end_status(&self, status: u16) {
        *self.end_status.lock().unwrap() = status;
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }
}

#[derive(Deserialize)]
struct CreateBody {
    username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndBody {
    room_code: String,
}

async fn create_room(state: web::Data<StubState>, body: web::Json<CreateBody>) -> HttpResponse {
    state.record(format!("POST /api/rooms/create {}", body.username));
    if body.username.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({"error": "username required"}));
    }
    let code = {
        let mut codes = state.next_codes.lock().unwrap();
        if codes.is_empty() {
            format!("R{:05}", state.rooms.lock().unwrap().len() + 1)
        } else {
            codes.remove(0)
        }
    };
    state.add_room(&code);
    HttpResponse::Ok().json(serde_json::json!({ "roomCode": code }))
}

async fn get_room(state: web::Data<StubState>, path: web::Path<String>) -> HttpResponse {
    let code = path.into_inner();
    state.record(format!("GET /api/rooms/{}", code));
    if state.has_room(&code) {
        HttpResponse::Ok().json(serde_json::json!({ "roomCode": code }))
    } else {
        HttpResponse::NotFound().json(serde_json::json!({"error": "Room not found"}))
    }
}

async fn end_room(state: web::Data<StubState>, body: web::Json<EndBody>) -> HttpResponse {
    state.record(format!("POST /api/rooms/end {}", body.room_code));
    let status = *state.end_status.lock().unwrap();
    if status != 200 {
        return HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap()).finish();
    }
    state.rooms.lock().unwrap().remove(&body.room_code);
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}

async fn products(state: web::Data<StubState>) -> HttpResponse {
    state.record("GET /api/products".to_string());
    let (status, body) = state.products.lock().unwrap().clone();
    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap())
        .content_type("application/json")
        .body(body)
}

/// Stub room service bound to a random local port
pub struct StubRoomServer {
    pub url: String,
    pub state: web::Data<StubState>,
    handle: ServerHandle,
}

impl StubRoomServer {
    pub async fn start() -> std::io::Result<Self> {
        let state = web::Data::new(StubState {
            rooms: Mutex::new(HashSet::new()),
            next_codes: Mutex::new(Vec::new()),
            products: Mutex::new((200, "[]".to_string())),
            end_status: Mutex::new(200),
            requests: Mutex::new(Vec::new()),
        });

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/api/rooms/create", web::post().to(create_room))
                .route("/api/rooms/end", web::post().to(end_room))
                .route("/api/rooms/{code}", web::get().to(get_room))
                .route("/api/products", web::get().to(products))
        })
        .workers(1)
        .bind("127.0.0.1:0")?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No bind address found"))?;

        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        // Give server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            url: format!("http://{}", addr),
            state,
            handle,
        })
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

// ---------------------------------------------------------------------------
// WebSocket relay (tokio-tungstenite)
// ---------------------------------------------------------------------------

struct RelayPeer {
    room: Option<RoomCode>,
    tx: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct RelayState {
    next_id: usize,
    peers: HashMap<usize, RelayPeer>,
    received: Vec<OutboundEvent>,
    echo_to_sender: bool,
}

/// Relays room events between WebSocket clients
#[derive(Clone)]
pub struct WsRelay {
    pub url: String,
    state: Arc<Mutex<RelayState>>,
}

impl WsRelay {
    pub async fn start(echo_to_sender: bool) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(RelayState {
            echo_to_sender,
            ..Default::default()
        }));

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(stream).await {
                        serve_peer(state, ws).await;
                    }
                });
            }
        });

        Ok(Self {
            url: format!("ws://{}/ws", addr),
            state,
        })
    }

    pub fn received(&self) -> Vec<OutboundEvent> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn peer_count(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }

    /// Send a raw text frame to every connected peer
    pub fn push_raw(&self, text: &str) {
        for peer in self.state.lock().unwrap().peers.values() {
            let _ = peer.tx.send(Message::Text(text.to_string().into()));
        }
    }
}

async fn serve_peer(
    state: Arc<Mutex<RelayState>>,
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
) {
    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let id = {
        let mut state = state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.peers.insert(id, RelayPeer { room: None, tx });
        id
    };

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = read.next().await {
        match msg {
            Message::Text(text) => {
                if let Ok(event) = serde_json::from_str::<OutboundEvent>(&text) {
                    relay(&state, id, event);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().unwrap().peers.remove(&id);
}

fn relay(state: &Arc<Mutex<RelayState>>, from: usize, event: OutboundEvent) {
    let mut state = state.lock().unwrap();
    let (room, inbound) = translate(&event);
    let frame = serde_json::to_string(&inbound).expect("Failed to encode event");
    let echo = state.echo_to_sender && matches!(event, OutboundEvent::SendMessage { .. });

    for (id, peer) in state.peers.iter_mut() {
        if *id == from {
            match &event {
                OutboundEvent::JoinRoom { .. } => peer.room = Some(room.clone()),
                OutboundEvent::LeaveRoom { .. } => peer.room = None,
                _ => {}
            }
            if echo {
                let _ = peer.tx.send(Message::Text(frame.clone().into()));
            }
        } else if peer.room.as_ref() == Some(&room) {
            let _ = peer.tx.send(Message::Text(frame.clone().into()));
        }
    }
    state.received.push(event);
}

/// Wait for condition with timeout
pub async fn wait_for_condition<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
