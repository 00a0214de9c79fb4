//! Signaling hub integration tests
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use std::time::Duration;

use axum::{
    extract::Query,
    http::{header, HeaderMap, StatusCode as AxumStatus},
    routing::get,
    Json, Router,
};
use integration_tests::{
    assert_json, test_config, wait_for_clients, Closed, TestClient, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_offer_is_forwarded_with_server_stamped_sender() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    alice
        .send_json(&json!({"type": "offer", "from": "spoofed", "to": "B", "data": {"sdp": "v=0"}}))
        .await
        .unwrap();

    let received: Value = bob.recv_json().await.unwrap();
    assert_eq!(received["type"], "offer");
    assert_eq!(received["from"], "A");
    assert_eq!(received["to"], "B");
    assert_eq!(received["data"]["sdp"], "v=0");
}

#[tokio::test]
async fn test_object_sender_field_is_replaced_not_rejected() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    alice
        .send_json(&json!({"type": "offer", "from": {"id": "mallory"}, "to": "B", "data": {}}))
        .await
        .unwrap();

    let received: Value = bob.recv_json().await.unwrap();
    assert_eq!(received["type"], "offer");
    assert_eq!(received["from"], "A");
}

#[tokio::test]
async fn test_answer_flows_back_to_caller() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    bob.send_json(&json!({"type": "answer", "to": "A", "data": {"sdp": "v=0"}}))
        .await
        .unwrap();

    let received: Value = alice.recv_json().await.unwrap();
    assert_eq!(received["type"], "answer");
    assert_eq!(received["from"], "B");
}

#[tokio::test]
async fn test_message_to_absent_client_is_dropped() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    wait_for_clients(&server, 1).await.unwrap();

    alice
        .send_json(&json!({"type": "offer", "to": "nobody", "data": {}}))
        .await
        .unwrap();

    // No error comes back and the sender stays connected
    alice.expect_silence(Duration::from_millis(300)).await.unwrap();
    alice
        .send_json(&json!({"type": "ice-servers-request"}))
        .await
        .unwrap();
    let reply: Value = alice.recv_json().await.unwrap();
    assert_eq!(reply["type"], "ice-servers");
}

#[tokio::test]
async fn test_malformed_frames_do_not_end_connection() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    alice.send_text("{not json").await.unwrap();
    alice
        .send_json(&json!({"type": "candidate", "to": "B", "data": {"candidate": "c1"}}))
        .await
        .unwrap();

    let received: Value = bob.recv_json().await.unwrap();
    assert_eq!(received["data"]["candidate"], "c1");
}

#[tokio::test]
async fn test_header_identity() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut carol = TestClient::connect(&server.ws_url("/ws"), Some("carol"))
        .await
        .unwrap();
    let mut alice = server.connect("A").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    alice
        .send_json(&json!({"type": "call-request", "to": "carol", "data": null}))
        .await
        .unwrap();

    let received: Value = carol.recv_json().await.unwrap();
    assert_eq!(received["type"], "call-request");
    assert_eq!(received["from"], "A");
}

// ============================================================================
// Control plane
// ============================================================================

#[tokio::test]
async fn test_ice_servers_request_is_rate_limited() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    wait_for_clients(&server, 1).await.unwrap();

    alice
        .send_json(&json!({"type": "ice-servers-request"}))
        .await
        .unwrap();
    let first: Value = alice.recv_json().await.unwrap();
    assert_eq!(first["type"], "ice-servers");
    assert_eq!(first["to"], "A");
    assert_eq!(
        first["data"]["iceServers"][0]["urls"],
        "stun:stun.l.google.com:19302"
    );

    tokio::time::sleep(Duration::from_secs(1)).await;

    alice
        .send_json(&json!({"type": "ice-servers-request"}))
        .await
        .unwrap();
    let second: Value = alice.recv_json().await.unwrap();
    assert_eq!(second["type"], "error");
    assert_eq!(second["data"]["reason"], "rate limited");
    assert_eq!(second["data"]["request"], "ice-servers-request");
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut alice = server.connect("A").await.unwrap();
    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();

    for client in [&mut alice, &mut bob] {
        client
            .send_json(&json!({"type": "ice-servers-request"}))
            .await
            .unwrap();
        let reply: Value = client.recv_json().await.unwrap();
        assert_eq!(reply["type"], "ice-servers");
    }
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_missing_identity_is_rejected() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();

    let response = server.get("/ws").await.unwrap();
    let body: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();

    assert_eq!(body["error"]["code"], "CLIENT_ID_REQUIRED");
    assert!(TestClient::connect(&server.ws_url("/ws"), None).await.is_err());
}

#[tokio::test]
async fn test_reconnect_supersedes_previous_connection() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let mut first = server.connect("A").await.unwrap();
    wait_for_clients(&server, 1).await.unwrap();

    let mut second = server.connect("A").await.unwrap();
    let closed = first.recv_close(Duration::from_secs(3)).await.unwrap();
    assert_eq!(
        closed,
        Closed::Frame(4001, "Superseded by a newer connection".to_string())
    );

    let mut bob = server.connect("B").await.unwrap();
    wait_for_clients(&server, 2).await.unwrap();
    bob.send_json(&json!({"type": "hangup", "to": "A", "data": {}}))
        .await
        .unwrap();

    let received: Value = second.recv_json().await.unwrap();
    assert_eq!(received["type"], "hangup");
}

#[tokio::test]
async fn test_disconnect_unregisters_client() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();
    let alice = server.connect("A").await.unwrap();
    wait_for_clients(&server, 1).await.unwrap();

    alice.close().await.unwrap();

    wait_for_clients(&server, 0).await.unwrap();
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let server = TestServer::hub(test_config(&[("CONNECTION_IDLE_TIMEOUT_SECS", "1")]))
        .await
        .unwrap();
    let mut alice = server.connect("A").await.unwrap();

    let closed = alice.recv_close(Duration::from_secs(4)).await.unwrap();

    assert_eq!(closed, Closed::Frame(4002, "Idle timeout".to_string()));
    wait_for_clients(&server, 0).await.unwrap();
}

// ============================================================================
// HTTP routes
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();

    let body: Value = assert_json(server.get("/health").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "relay-hub");
    assert_eq!(body["clients"], 0);
}

#[tokio::test]
async fn test_ice_servers_endpoint_includes_turn() {
    let server = TestServer::hub(test_config(&[
        ("ICE_STUN_URLS", "stun:a.example:3478,stun:b.example:3478"),
        ("ICE_TURN_URL", "turn:turn.example:3478"),
        ("ICE_TURN_USERNAME", "user"),
        ("ICE_TURN_CREDENTIAL", "secret"),
    ]))
    .await
    .unwrap();

    let body: Value = assert_json(server.get("/ice-servers").await.unwrap(), StatusCode::OK)
        .await
        .unwrap();

    let servers = body["iceServers"].as_array().unwrap();
    assert_eq!(servers.len(), 3);
    assert_eq!(servers[0]["urls"], "stun:a.example:3478");
    assert!(servers[0].get("username").is_none());
    assert_eq!(servers[2]["urls"], "turn:turn.example:3478");
    assert_eq!(servers[2]["username"], "user");
    assert_eq!(servers[2]["credential"], "secret");
}

async fn issue_credentials(
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (AxumStatus, Json<Value>) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (
        AxumStatus::CREATED,
        Json(json!({"role": query.get("role"), "authorization": authorization})),
    )
}

#[tokio::test]
async fn test_turn_credentials_passthrough() {
    let issuer = TestServer::serve(Router::new().route("/credentials", get(issue_credentials)))
        .await
        .unwrap();
    let credentials_url = format!("{}/credentials", issuer.base_url());
    let server = TestServer::hub(test_config(&[("TURN_CREDENTIALS_URL", credentials_url.as_str())]))
        .await
        .unwrap();

    let response = server
        .client
        .get(format!("{}/turn-credentials?role=caller", server.base_url()))
        .header("Authorization", "Bearer abc")
        .send()
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert_eq!(body["role"], "caller");
    assert_eq!(body["authorization"], "Bearer abc");
}

#[tokio::test]
async fn test_turn_credentials_unconfigured() {
    let server = TestServer::hub(test_config(&[])).await.unwrap();

    let response = server.get("/turn-credentials?role=caller").await.unwrap();
    let body: Value = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();

    assert_eq!(body["error"]["code"], "UPSTREAM_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_turn_credentials_upstream_unreachable() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/credentials");
    let server = TestServer::hub(test_config(&[("TURN_CREDENTIALS_URL", url.as_str())]))
        .await
        .unwrap();

    let response = server.get("/turn-credentials").await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_turn_credentials_issuer_timeout() {
    let issuer = TestServer::serve(Router::new().route(
        "/credentials",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "too late"
        }),
    ))
    .await
    .unwrap();
    let credentials_url = format!("{}/credentials", issuer.base_url());
    let server = TestServer::hub(test_config(&[
        ("TURN_CREDENTIALS_URL", credentials_url.as_str()),
        ("TURN_CREDENTIALS_TIMEOUT_SECS", "1"),
    ]))
    .await
    .unwrap();

    let started = std::time::Instant::now();
    let response = server.get("/turn-credentials").await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(5));
}
