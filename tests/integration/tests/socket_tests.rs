//! Socket manager integration tests
//!
//! Each test runs its own local WebSocket server on an ephemeral port.
//!
//! Run with: cargo test -p integration-tests --test socket_tests

use std::time::Duration;

use integration_tests::{
    eventually, fast_config, within, TestServer, FAST_RECONNECT, SERVER_CLOSE_CODE,
};
use pulse_socket::{IncomingMessage, ReadyState, SocketConfig, SocketManager};
use serde_json::json;

// ============================================================================
// Messaging
// ============================================================================

#[tokio::test]
async fn test_json_round_trip() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/echo"))).unwrap();
    let mut messages = manager.messages();

    within(manager.wait_for(|s| s.is_open())).await.unwrap();
    assert_eq!(manager.reconnect_attempts(), 0);

    let payload = json!({"type": "order.created", "id": 42});
    assert!(manager.send(&payload).unwrap());

    let received = within(messages.recv()).await.unwrap();
    assert_eq!(received, IncomingMessage::Json(payload.clone()));
    assert_eq!(manager.last_message(), Some(IncomingMessage::Json(payload)));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_non_json_text_is_delivered_raw() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/echo"))).unwrap();
    let mut messages = manager.messages();

    within(manager.wait_for(|s| s.is_open())).await.unwrap();

    assert!(manager.send_text("hello there"));
    assert!(manager.send_text("{\"truncated\":"));

    let first = within(messages.recv()).await.unwrap();
    let second = within(messages.recv()).await.unwrap();
    assert_eq!(first, IncomingMessage::Text("hello there".to_string()));
    assert_eq!(second, IncomingMessage::Text("{\"truncated\":".to_string()));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_server_pushed_messages_in_order() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/greet"))).unwrap();
    let mut messages = manager.messages();

    let greeting = within(messages.recv()).await.unwrap();
    assert_eq!(greeting.as_json(), Some(&json!({"type": "hello", "version": 1})));

    let line = within(messages.recv()).await.unwrap();
    assert_eq!(line.as_text(), Some("plain text line"));

    let bytes = within(messages.recv()).await.unwrap();
    assert_eq!(bytes, IncomingMessage::Binary(vec![0xff, 0xfe, 0x00]));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_send_while_not_open_is_dropped() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = SocketConfig::builder(server.url("/reject"))
        .reconnect_interval(Duration::from_secs(3600))
        .build();
    let manager = SocketManager::start(config).unwrap();

    assert!(!manager.send(&json!({"type": "ping"})).unwrap());

    within(manager.wait_for(|s| s.reconnect_pending)).await.unwrap();
    assert_eq!(manager.ready_state(), ReadyState::Closed);
    assert!(!manager.send_text("ping"));

    manager.shutdown().await;
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = SocketConfig::builder(server.url("/close-once"))
        .reconnect_interval(Duration::from_millis(300))
        .build();
    let manager = SocketManager::start(config).unwrap();

    let closed = within(manager.wait_for(|s| s.reconnect_pending))
        .await
        .unwrap();
    assert_eq!(closed.ready_state, ReadyState::Closed);
    assert_eq!(closed.reconnect_attempts, 1);
    let close = closed.last_close.expect("close recorded");
    assert_eq!(close.code, SERVER_CLOSE_CODE);
    assert_eq!(close.reason, "server closing");

    let reopened = within(manager.wait_for(|s| s.is_open())).await.unwrap();
    assert_eq!(reopened.reconnect_attempts, 0);
    assert_eq!(server.accepted(), 2);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_attempts_are_bounded() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = SocketConfig::builder(server.url("/reject"))
        .reconnect_interval(Duration::from_millis(20))
        .max_reconnect_attempts(3)
        .build();
    let manager = SocketManager::start(config).unwrap();

    let snapshot = within(manager.wait_for(|s| s.exhausted)).await.unwrap();
    assert_eq!(snapshot.ready_state, ReadyState::Closed);
    assert_eq!(snapshot.reconnect_attempts, 3);
    assert!(!snapshot.reconnect_pending);
    assert!(snapshot.last_error.is_some());

    // Give a stray timer every chance to fire
    tokio::time::sleep(FAST_RECONNECT * 4).await;
    assert_eq!(server.rejected(), 4);
    assert_eq!(manager.ready_state(), ReadyState::Closed);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_explicit_connect_restarts_exhausted_session() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = SocketConfig::builder(server.url("/reject"))
        .reconnect_interval(Duration::from_millis(20))
        .max_reconnect_attempts(1)
        .build();
    let manager = SocketManager::start(config).unwrap();

    within(manager.wait_for(|s| s.exhausted)).await.unwrap();
    eventually(|| server.rejected() == 2).await;

    manager.connect().unwrap();
    eventually(|| server.rejected() == 4).await;
    within(manager.wait_for(|s| s.exhausted)).await.unwrap();

    tokio::time::sleep(FAST_RECONNECT * 4).await;
    assert_eq!(server.rejected(), 4);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_connect_ignored_while_open() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/echo"))).unwrap();

    within(manager.wait_for(|s| s.is_open())).await.unwrap();
    manager.connect().unwrap();

    tokio::time::sleep(FAST_RECONNECT * 2).await;
    assert_eq!(server.accepted(), 1);
    assert_eq!(manager.ready_state(), ReadyState::Open);

    manager.shutdown().await;
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_open_transport() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/echo"))).unwrap();
    let watch = manager.watch();

    within(manager.wait_for(|s| s.is_open())).await.unwrap();
    within(manager.shutdown()).await;

    let last = watch.borrow().clone();
    assert_eq!(last.ready_state, ReadyState::Closed);
    assert!(last.torn_down);
    assert_eq!(last.reconnect_attempts, 0);
    eventually(|| server.closed() == 1).await;
}

#[tokio::test]
async fn test_shutdown_cancels_pending_reconnect() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = SocketConfig::builder(server.url("/close"))
        .reconnect_interval(Duration::from_millis(200))
        .build();
    let manager = SocketManager::start(config).unwrap();

    within(manager.wait_for(|s| s.reconnect_pending))
        .await
        .unwrap();
    within(manager.shutdown()).await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_dropping_manager_tears_down() {
    let server = TestServer::start().await.expect("Failed to start server");
    let manager = SocketManager::start(fast_config(server.url("/echo"))).unwrap();
    let watch = manager.watch();

    within(manager.wait_for(|s| s.is_open())).await.unwrap();
    drop(manager);

    eventually(|| server.closed() == 1).await;
    eventually(|| watch.borrow().torn_down).await;
    assert_eq!(server.accepted(), 1);
}
