/// Real-time room channel over WebSocket.
///
/// One JSON text frame per event. Reader and writer halves run as spawned
/// tasks and talk to the channel handle over unbounded queues, so frames are
/// delivered in the order they arrived.

use crate::error::{ClientError, Result};
use crate::models::{InboundEvent, OutboundEvent};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// An open real-time channel to a room.
#[allow(async_fn_in_trait)]
pub trait RealtimeChannel {
    async fn emit(&self, event: &OutboundEvent) -> Result<()>;

    /// Next inbound event; `None` once the channel has closed
    async fn next_event(&mut self) -> Option<InboundEvent>;

    async fn close(&mut self);
}

/// Opens channels; one per room membership.
#[allow(async_fn_in_trait)]
pub trait ChannelConnector {
    type Channel: RealtimeChannel;

    async fn connect(&self) -> Result<Self::Channel>;
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ChannelConnector for WebSocketConnector {
    type Channel = WebSocketChannel;

    async fn connect(&self) -> Result<WebSocketChannel> {
        WebSocketChannel::connect(&self.url).await
    }
}

/// WebSocket channel handle
pub struct WebSocketChannel {
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
    state: ConnectionState,
}

impl WebSocketChannel {
    /// Connect to the room service WebSocket
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::WebSocketError(format!("Connecting to {} failed: {}", url, e)))?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = unbounded::<Message>();
        let (tx_in, rx_in) = unbounded::<Message>();

        // Outgoing frames
        tokio::spawn(async move {
            while let Some(msg) = rx.next().await {
                if let Err(e) = write.send(msg).await {
                    log::error!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Incoming frames
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(msg) => {
                        if tx_in.unbounded_send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("WebSocket read failed: {}", e);
                        break;
                    }
                }
            }
        });

        log::info!("WebSocket connected to {}", url);
        Ok(Self {
            sender: tx,
            receiver: rx_in,
            state: ConnectionState::Connected,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

impl RealtimeChannel for WebSocketChannel {
    async fn emit(&self, event: &OutboundEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        log::debug!("-> {}", json);
        self.sender
            .unbounded_send(Message::Text(json.into()))
            .map_err(|_| ClientError::WebSocketError(format!("Channel closed, {} not sent", event.name())))
    }

    async fn next_event(&mut self) -> Option<InboundEvent> {
        while let Some(msg) = self.receiver.next().await {
            match msg {
                Message::Text(text) => {
                    log::debug!("<- {}", text.as_str());
                    match serde_json::from_str::<InboundEvent>(&text) {
                        Ok(event) => return Some(event),
                        Err(e) => log::debug!("Skipping unrecognized frame: {}", e),
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        self.state = ConnectionState::Disconnected;
        None
    }

    async fn close(&mut self) {
        if self.state == ConnectionState::Connected {
            let _ = self.sender.unbounded_send(Message::Close(None));
        }
        self.sender.close_channel();
        self.state = ConnectionState::Disconnected;
    }
}
