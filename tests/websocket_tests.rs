/// Integration tests for the WebSocket room channel
///
/// Tests cover connecting to a relay, emitting and receiving room events,
/// skipping frames that are not room events, and channel closure.

mod common;

use common::{wait_for_condition, WsRelay, EVENT_TIMEOUT};
use coshop_client::error::ClientError;
use coshop_client::models::{ChatMessage, InboundEvent, OutboundEvent, RoomCode};
use coshop_client::websocket::{
    ChannelConnector, ConnectionState, RealtimeChannel, WebSocketChannel, WebSocketConnector,
};
use tokio::time::timeout;

fn room() -> RoomCode {
    RoomCode::parse("ABC123").unwrap()
}

async fn join(channel: &WebSocketChannel, username: &str) {
    channel
        .emit(&OutboundEvent::JoinRoom {
            room_code: room(),
            username: username.to_string(),
        })
        .await
        .expect("Join should be sent");
}

#[tokio::test]
async fn test_connect_and_emit() {
    let relay = WsRelay::start(false).await.expect("Failed to start relay");
    let connector = WebSocketConnector::new(&relay.url);

    let channel = connector.connect().await.expect("Should connect");
    assert_eq!(channel.state(), ConnectionState::Connected);

    join(&channel, "alice").await;

    let relay_view = relay.clone();
    assert!(
        wait_for_condition(|| relay_view.received().len() == 1, EVENT_TIMEOUT).await,
        "Relay should receive the join"
    );
    assert_eq!(
        relay.received()[0],
        OutboundEvent::JoinRoom {
            room_code: room(),
            username: "alice".to_string()
        }
    );
}

#[tokio::test]
async fn test_connect_refused() {
    let result = WebSocketChannel::connect("ws://127.0.0.1:9/ws").await;
    assert!(matches!(result, Err(ClientError::WebSocketError(_))));
}

#[tokio::test]
async fn test_events_between_channels() {
    let relay = WsRelay::start(false).await.expect("Failed to start relay");
    let connector = WebSocketConnector::new(&relay.url);

    let mut alice = connector.connect().await.unwrap();
    let mut bob = connector.connect().await.unwrap();
    join(&alice, "alice").await;
    let relay_view = relay.clone();
    assert!(wait_for_condition(|| relay_view.received().len() == 1, EVENT_TIMEOUT).await);
    join(&bob, "bob").await;

    let joined = timeout(EVENT_TIMEOUT, alice.next_event()).await.unwrap();
    assert_eq!(
        joined,
        Some(InboundEvent::UserJoined {
            username: "bob".to_string()
        })
    );

    let message = ChatMessage::text("alice", "look at this lamp");
    alice
        .emit(&OutboundEvent::SendMessage {
            room_code: room(),
            message: message.clone(),
        })
        .await
        .unwrap();

    match timeout(EVENT_TIMEOUT, bob.next_event()).await.unwrap() {
        Some(InboundEvent::ReceiveMessage(received)) => {
            assert_eq!(received.id, message.id);
            assert_eq!(received.sender, "alice");
            assert_eq!(received.text, "look at this lamp");
        }
        other => panic!("expected a chat message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unrecognized_frames_are_skipped() {
    let relay = WsRelay::start(false).await.expect("Failed to start relay");
    let mut channel = WebSocketConnector::new(&relay.url).connect().await.unwrap();

    let relay_view = relay.clone();
    assert!(wait_for_condition(|| relay_view.peer_count() == 1, EVENT_TIMEOUT).await);

    relay.push_raw("not json");
    relay.push_raw(r#"{"event":"video-offer","data":{}}"#);
    relay.push_raw(r#"{"event":"user-joined","data":{"username":"carol"}}"#);

    let event = timeout(EVENT_TIMEOUT, channel.next_event()).await.unwrap();
    assert_eq!(
        event,
        Some(InboundEvent::UserJoined {
            username: "carol".to_string()
        })
    );
}

#[tokio::test]
async fn test_message_with_counter_id_is_delivered() {
    let relay = WsRelay::start(false).await.expect("Failed to start relay");
    let mut channel = WebSocketConnector::new(&relay.url).connect().await.unwrap();

    let relay_view = relay.clone();
    assert!(wait_for_condition(|| relay_view.peer_count() == 1, EVENT_TIMEOUT).await);

    relay.push_raw(r#"{"event":"receive-message","data":{"id":5,"sender":"Sarah M.","text":"Hey!"}}"#);

    match timeout(EVENT_TIMEOUT, channel.next_event()).await.unwrap() {
        Some(InboundEvent::ReceiveMessage(message)) => {
            assert_eq!(message.id, None);
            assert_eq!(message.text, "Hey!");
        }
        other => panic!("expected a chat message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_close_stops_channel() {
    let relay = WsRelay::start(false).await.expect("Failed to start relay");
    let mut channel = WebSocketConnector::new(&relay.url).connect().await.unwrap();

    let relay_view = relay.clone();
    assert!(wait_for_condition(|| relay_view.peer_count() == 1, EVENT_TIMEOUT).await);

    channel.close().await;

    assert_eq!(channel.state(), ConnectionState::Disconnected);
    assert!(channel.emit(&OutboundEvent::EndRoom(room())).await.is_err());

    let relay_view = relay.clone();
    assert!(
        wait_for_condition(|| relay_view.peer_count() == 0, EVENT_TIMEOUT).await,
        "Relay should see the peer go away"
    );
}
