//! Socket messages feeding the toast queue
//!
//! Run with: cargo test -p integration-tests --test toast_feed_tests

use std::time::Duration;

use integration_tests::{fast_config, within, TestServer};
use pulse_common::{AppConfig, ToastSettings};
use pulse_core::{ToastConfig, ToastInput, ToastStore};
use pulse_socket::{IncomingMessage, SocketConfig, SocketManager};

fn toast_for(message: &IncomingMessage) -> Option<ToastInput> {
    let kind = message.as_json()?.get("type")?.as_str()?.to_string();
    Some(ToastInput::new().title(kind).description(message.to_string()))
}

#[tokio::test]
async fn test_incoming_messages_raise_toasts() {
    let server = TestServer::start().await.expect("Failed to start server");
    let toasts = ToastStore::new(ToastConfig::default()).unwrap();
    let mut changes = toasts.subscribe();

    let manager = SocketManager::start(fast_config(server.url("/greet"))).unwrap();
    let mut messages = manager.messages();

    // Only the JSON greeting maps to a toast
    for _ in 0..3 {
        let message = within(messages.recv()).await.unwrap();
        if let Some(input) = toast_for(&message) {
            toasts.show(input);
        }
    }

    let list = within(changes.recv()).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title.as_deref(), Some("hello"));
    assert!(list[0].open);

    manager.shutdown().await;
    toasts.shutdown();
}

#[tokio::test]
async fn test_configs_built_from_environment() {
    let lookup = |key: &'static str| match key {
        "SOCKET_URL" => Some("ws://127.0.0.1:9/feed".to_string()),
        "SOCKET_RECONNECT_INTERVAL_MS" => Some("250".to_string()),
        "SOCKET_MAX_RECONNECT_ATTEMPTS" => Some("2".to_string()),
        "TOAST_LIMIT" => Some("3".to_string()),
        _ => None,
    };
    let config = AppConfig::from_lookup(lookup).unwrap();

    let socket = SocketConfig::from(&config.socket);
    assert_eq!(socket.reconnect_interval, Duration::from_millis(250));
    assert_eq!(socket.max_reconnect_attempts, 2);
    assert!(socket.validate().is_ok());

    let toast = ToastConfig::from(&config.toast);
    assert_eq!(toast.limit, 3);
    assert_eq!(
        ToastConfig::from(&ToastSettings::default()).limit,
        ToastConfig::default().limit
    );

    let store = ToastStore::new(toast).unwrap();
    for n in 0..5 {
        store.show(ToastInput::new().title(format!("toast {n}")));
    }
    assert_eq!(store.toasts().len(), 3);
    store.shutdown();
}
