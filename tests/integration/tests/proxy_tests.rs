//! Proxy integration tests
//!
//! Run with: cargo test -p integration-tests --test proxy_tests

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use integration_tests::{assert_json, test_config, Closed, FakeUpstream, TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

async fn proxy_for(upstream: &FakeUpstream) -> TestServer {
    let url = upstream.url();
    TestServer::proxy(test_config(&[("PROXY_UPSTREAM_URL", url.as_str())]))
        .await
        .unwrap()
}

/// Next data frame from the upstream side, skipping control frames
async fn upstream_recv(
    socket: &mut tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
) -> Option<Message> {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(3), socket.next())
            .await
            .expect("timed out waiting for upstream frame");
        match next {
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(message)) => return Some(message),
            Some(Err(_)) | None => return None,
        }
    }
}

#[tokio::test]
async fn test_upstream_receives_identity_headers() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let _client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();
    let peer = upstream.accept().await.unwrap();

    assert_eq!(peer.user_id.as_deref(), Some("alice"));
    assert_eq!(peer.origin.as_deref(), Some("http://localhost:8081"));
}

#[tokio::test]
async fn test_header_identity_is_forwarded() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let _client = TestClient::connect(&proxy.ws_url("/ws"), Some("bob"))
        .await
        .unwrap();
    let peer = upstream.accept().await.unwrap();

    assert_eq!(peer.user_id.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_client_messages_arrive_upstream_in_order() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let mut client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();
    let mut peer = upstream.accept().await.unwrap();

    for i in 0..20 {
        client.send_text(&format!("message-{i}")).await.unwrap();
    }
    client.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

    for i in 0..20 {
        let message = upstream_recv(&mut peer.socket).await;
        assert_eq!(message, Some(Message::Text(format!("message-{i}"))));
    }
    assert_eq!(
        upstream_recv(&mut peer.socket).await,
        Some(Message::Binary(vec![1, 2, 3]))
    );
}

#[tokio::test]
async fn test_upstream_messages_reach_client() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let mut client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();
    let mut peer = upstream.accept().await.unwrap();

    peer.socket
        .send(Message::Text(r#"{"event":"ready"}"#.to_string()))
        .await
        .unwrap();

    let received: Value = client.recv_json().await.unwrap();
    assert_eq!(received["event"], "ready");
}

#[tokio::test]
async fn test_upstream_close_closes_client() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let mut client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();
    let mut peer = upstream.accept().await.unwrap();

    peer.socket.close(None).await.unwrap();

    // Any kind of close is fine, as long as it happens promptly
    client.recv_close(Duration::from_secs(3)).await.unwrap();
}

#[tokio::test]
async fn test_client_close_closes_upstream() {
    let mut upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();
    let mut peer = upstream.accept().await.unwrap();

    client.close().await.unwrap();

    loop {
        match upstream_recv(&mut peer.socket).await {
            None | Some(Message::Close(_)) => break,
            Some(other) => panic!("unexpected frame after client close: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_unreachable_upstream_closes_client_with_1011() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("ws://{addr}/communication/v1/ws");
    let proxy = TestServer::proxy(test_config(&[("PROXY_UPSTREAM_URL", url.as_str())]))
        .await
        .unwrap();

    let mut client = TestClient::connect(&proxy.ws_url("/ws?userId=alice"), None)
        .await
        .unwrap();

    let closed = client.recv_close(Duration::from_secs(5)).await.unwrap();
    assert_eq!(
        closed,
        Closed::Frame(1011, "Backend connection failed".to_string())
    );
}

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let response = proxy.get("/ws").await.unwrap();
    let body: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();

    assert_eq!(body["error"]["code"], "CLIENT_ID_REQUIRED");
}

#[tokio::test]
async fn test_health_check() {
    let upstream = FakeUpstream::start().await.unwrap();
    let proxy = proxy_for(&upstream).await;

    let body: Value = assert_json(proxy.get("/health").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "relay-proxy");
}
