//! HTTP API Tests
//!
//! Drives the router with `tower::ServiceExt::oneshot`. Tests that need a second
//! node start a real one on `127.0.0.1:0` so redirects, owner lookup and
//! replication go over the wire.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use object_cluster::config::NodeConfig;
use object_cluster::containers::types::ContainerId;
use object_cluster::objects::store::ObjectStore;
use object_cluster::replication::protocol::ReplicateRequest;
use object_cluster::replication::types::Operation;
use object_cluster::server::router::router;
use object_cluster::server::state::AppState;
use object_cluster::topology::service::ClusterTopology;
use object_cluster::topology::types::NodeId;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================
// HARNESS
// ============================================================

fn node_a_config(peer: Option<SocketAddr>) -> NodeConfig {
    let peers = match peer {
        Some(addr) => format!(r#"[{{ "id": "node-b", "addr": "{}" }}]"#, addr),
        None => "[]".to_string(),
    };
    let raw = format!(
        r#"{{
            "node": {{ "id": "node-a", "bind": "127.0.0.1:1" }},
            "peers": {},
            "server": {{ "max_transfer_size": 16 }},
            "replication": {{ "timeout_ms": 1000 }},
            "users": [
                {{ "api_key": "alice-key", "user": "alice" }},
                {{ "api_key": "reader-key", "user": "alice",
                   "permissions": {{ "write_object": false, "delete_container": false }} }},
                {{ "api_key": "bob-key", "user": "bob" }}
            ],
            "containers": [
                {{ "user": "alice", "name": "docs", "owners": ["node-a"],
                   "key_values": {{ "project": "x" }} }},
                {{ "user": "alice", "name": "public", "public_write": true, "owners": ["node-a"] }},
                {{ "user": "alice", "name": "shared", "owners": ["node-a", "node-b"] }},
                {{ "user": "alice", "name": "lonely", "owners": ["node-a", "node-ghost"] }}
            ]
        }}"#,
        peers
    );
    NodeConfig::from_json(&raw).unwrap()
}

fn build_state(config: &NodeConfig) -> Arc<AppState> {
    let id = NodeId(config.node.id.clone().unwrap());
    let topology = ClusterTopology::from_config(config, id);
    AppState::from_config(config, topology)
}

fn node_a() -> Arc<AppState> {
    build_state(&node_a_config(None))
}

/// Starts node B, which holds `bob/remote` and a replica of `alice/shared`.
async fn spawn_node_b() -> (SocketAddr, Arc<AppState>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = NodeConfig::from_json(
        r#"{
            "node": { "id": "node-b" },
            "containers": [
                { "user": "bob", "name": "remote", "owners": ["node-b"] },
                { "user": "alice", "name": "shared", "owners": ["node-a", "node-b"] }
            ]
        }"#,
    )
    .unwrap();
    config.node.bind = addr;

    let state = build_state(&config);
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn seed(state: &AppState, user: &str, container: &str, key: &str, data: &[u8]) {
    state
        .store
        .create(&ContainerId::new(user, container), key, "text/plain", data)
        .await
        .unwrap();
}

async fn content(state: &AppState, user: &str, container: &str, key: &str) -> Option<Vec<u8>> {
    state
        .store
        .read(&ContainerId::new(user, container), key, 0, u64::MAX)
        .await
        .ok()
        .map(|slice| slice.data)
}

fn request(method: &str, uri: &str, api_key: Option<&str>, body: &[u8]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn envelope(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================
// INTERNODE
// ============================================================

#[tokio::test]
async fn test_health() {
    let state = node_a();
    let (status, body) = send(&state, request("GET", "/_cluster/health", None, b"")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope(&body)["node_id"], "node-a");
}

#[tokio::test]
async fn test_container_lookup() {
    let state = node_a();

    let (status, _) = send(&state, request("GET", "/_cluster/containers/ALICE/docs", None, b"")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, request("GET", "/_cluster/containers/alice/nope", None, b"")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replicate_endpoint_applies_and_deduplicates() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"abc").await;

    let body = ReplicateRequest {
        op_id: "op-1".to_string(),
        user: "alice".to_string(),
        container: "docs".to_string(),
        settings: BTreeMap::new(),
        operation: Operation::Rename {
            key: "k1".to_string(),
            new_key: "k2".to_string(),
        },
    }
    .encode()
    .unwrap();

    let (status, _) = send(&state, request("POST", "/_cluster/replicate", None, &body)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&state, request("POST", "/_cluster/replicate", None, &body)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(content(&state, "alice", "docs", "k2").await.unwrap(), b"abc");

    let (status, _) = send(&state, request("POST", "/_cluster/replicate", None, b"garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================
// WRITE PIPELINE
// ============================================================

#[tokio::test]
async fn test_range_write_overwrites() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(
        &state,
        request("PUT", "/alice/docs/k1?offset=0", Some("alice-key"), b"AB"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(content(&state, "alice", "docs", "k1").await.unwrap(), b"AB");
}

#[tokio::test]
async fn test_nested_keys() {
    let state = node_a();
    seed(&state, "alice", "docs", "dir/sub/k1", b"XY").await;

    let (status, _) = send(
        &state,
        request("PUT", "/alice/docs/dir/sub/k1?offset=2", Some("alice-key"), b"Z"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content(&state, "alice", "docs", "dir/sub/k1").await.unwrap(), b"XYZ");
}

#[tokio::test]
async fn test_public_write_without_key() {
    let state = node_a();
    seed(&state, "alice", "public", "k1", b"XY").await;

    let (status, _) = send(&state, request("PUT", "/alice/public/k1?offset=0", None, b"AB")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content(&state, "alice", "public", "k1").await.unwrap(), b"AB");
}

#[tokio::test]
async fn test_private_write_without_key_is_unauthorized() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(&state, request("PUT", "/alice/docs/k1?offset=0", None, b"AB")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(&body)["errorId"], 1);
    assert_eq!(content(&state, "alice", "docs", "k1").await.unwrap(), b"XY");
}

#[tokio::test]
async fn test_read_only_key_is_unauthorized() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(
        &state,
        request("PUT", "/alice/docs/k1?offset=0", Some("reader-key"), b"AB"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(&body)["errorId"], 3);
}

#[tokio::test]
async fn test_missing_object_and_container() {
    let state = node_a();

    let (status, body) = send(
        &state,
        request("PUT", "/alice/docs/nope?rename=k2", Some("alice-key"), b""),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope(&body)["message"], "Object does not exist.");

    let (status, body) = send(
        &state,
        request("PUT", "/alice/unknown/k1?offset=0", Some("alice-key"), b"A"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope(&body)["message"], "Unknown user or container.");
}

#[tokio::test]
async fn test_bad_queries() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(&state, request("PUT", "/alice/docs/k1", Some("alice-key"), b"A")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope(&body)["errorId"], 2);

    let (status, _) = send(
        &state,
        request("PUT", "/alice/docs/k1?offset=-3", Some("alice-key"), b"A"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payload_too_large() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(
        &state,
        request("PUT", "/alice/docs/k1?offset=0", Some("alice-key"), &[1u8; 32]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(envelope(&body)["errorId"], 11);
    assert_eq!(content(&state, "alice", "docs", "k1").await.unwrap(), b"XY");
}

#[tokio::test]
async fn test_oversized_create_is_rejected() {
    let state = node_a();

    let (status, body) = send(&state, request("POST", "/alice/docs/big", Some("alice-key"), &[1u8; 32])).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(envelope(&body)["errorId"], 11);
    assert!(content(&state, "alice", "docs", "big").await.is_none());
}

#[tokio::test]
async fn test_oversized_anonymous_write_is_unauthenticated() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, body) = send(&state, request("PUT", "/alice/docs/k1?offset=0", None, &[1u8; 32])).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(&body)["errorId"], 1);
    assert_eq!(content(&state, "alice", "docs", "k1").await.unwrap(), b"XY");
}

#[tokio::test]
async fn test_oversized_write_to_remote_container_redirects() {
    let (b_addr, _node_b) = spawn_node_b().await;
    let state = build_state(&node_a_config(Some(b_addr)));

    let response = router(state.clone())
        .oneshot(request("PUT", "/bob/remote/k1?offset=4", Some("bob-key"), &[1u8; 32]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("http://{}/bob/remote/k1?offset=4", b_addr).as_str()
    );
}

#[tokio::test]
async fn test_rename_ignores_oversized_body() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"data").await;

    let (status, _) = send(
        &state,
        request("PUT", "/alice/docs/k1?rename=k2", Some("alice-key"), &[1u8; 32]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content(&state, "alice", "docs", "k2").await.unwrap(), b"data");
}

#[tokio::test]
async fn test_rename() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"data").await;

    let (status, _) = send(
        &state,
        request("PUT", "/alice/docs/k1?rename=k2", Some("alice-key"), b""),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(content(&state, "alice", "docs", "k1").await.is_none());
    assert_eq!(content(&state, "alice", "docs", "k2").await.unwrap(), b"data");
}

#[tokio::test]
async fn test_failed_replication_rolls_back() {
    let state = node_a();
    seed(&state, "alice", "lonely", "k1", b"HELLO").await;

    let (status, body) = send(
        &state,
        request("PUT", "/alice/lonely/k1?offset=10", Some("alice-key"), b"Z"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = envelope(&body);
    assert_eq!(json["errorId"], 10);
    assert!(json["message"].is_null());
    assert_eq!(content(&state, "alice", "lonely", "k1").await.unwrap(), b"HELLO");
}

#[tokio::test]
async fn test_remote_container_redirects() {
    let (b_addr, _node_b) = spawn_node_b().await;
    let state = build_state(&node_a_config(Some(b_addr)));

    let response = router(state.clone())
        .oneshot(request("PUT", "/bob/remote/k1?offset=4", Some("bob-key"), b"AB"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("http://{}/bob/remote/k1?offset=4", b_addr).as_str()
    );
}

#[tokio::test]
async fn test_create_and_write_replicate_to_peer() {
    let (b_addr, node_b) = spawn_node_b().await;
    let state = build_state(&node_a_config(Some(b_addr)));

    let (status, _) = send(
        &state,
        request("POST", "/alice/shared/notes.txt", Some("alice-key"), b"HELLO"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(content(&node_b, "alice", "shared", "notes.txt").await.unwrap(), b"HELLO");

    let (status, _) = send(
        &state,
        request("PUT", "/alice/shared/notes.txt?offset=5", Some("alice-key"), b"!!"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content(&state, "alice", "shared", "notes.txt").await.unwrap(), b"HELLO!!");
    assert_eq!(content(&node_b, "alice", "shared", "notes.txt").await.unwrap(), b"HELLO!!");

    let (status, _) = send(
        &state,
        request("POST", "/alice/shared/notes.txt", Some("alice-key"), b"again"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============================================================
// CONTAINER LIFECYCLE
// ============================================================

#[tokio::test]
async fn test_delete_container_requires_owner_and_permission() {
    let state = node_a();

    let (status, body) = send(&state, request("DELETE", "/alice/docs", None, b"")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(&body)["errorId"], 1);

    let (status, body) = send(&state, request("DELETE", "/alice/docs", Some("bob-key"), b"")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(envelope(&body)["errorId"], 3);

    let (status, _) = send(&state, request("DELETE", "/alice/docs", Some("reader-key"), b"")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&state, request("DELETE", "/alice/nope", Some("alice-key"), b"")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(envelope(&body)["errorId"], 5);
}

#[tokio::test]
async fn test_clear_audit_log_and_keys() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;
    send(
        &state,
        request("PUT", "/alice/docs/k1?offset=0", Some("alice-key"), b"A"),
    )
    .await;
    let id = ContainerId::new("alice", "docs");
    assert_eq!(state.registry.audit_log(&id).len(), 1);
    assert_eq!(state.registry.key_values(&id).len(), 1);

    let (status, _) = send(
        &state,
        request("DELETE", "/alice/docs?audit_log=true", Some("alice-key"), b""),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.registry.audit_log(&id).is_empty());

    let (status, _) = send(
        &state,
        request("DELETE", "/alice/docs?keys=true", Some("alice-key"), b""),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.registry.key_values(&id).is_empty());
    assert!(state.registry.contains(&id));
}

#[tokio::test]
async fn test_delete_container() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;

    let (status, _) = send(&state, request("DELETE", "/alice/docs", Some("alice-key"), b"")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!state.registry.contains(&ContainerId::new("alice", "docs")));
    assert!(content(&state, "alice", "docs", "k1").await.is_none());
}

#[tokio::test]
async fn test_list_containers() {
    let state = node_a();
    seed(&state, "alice", "docs", "k1", b"XY").await;
    seed(&state, "alice", "docs", "k2", b"XYZ").await;

    let (status, body) = send(&state, request("GET", "/alice", Some("alice-key"), b"")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(names, vec!["docs", "lonely", "public", "shared"]);

    let (status, body) = send(&state, request("GET", "/alice?stats=true", Some("alice-key"), b"")).await;
    assert_eq!(status, StatusCode::OK);
    let summaries = envelope(&body);
    assert_eq!(summaries[0]["name"], "docs");
    assert_eq!(summaries[0]["object_count"], 2);
    assert_eq!(summaries[0]["total_bytes"], 5);

    let (status, _) = send(&state, request("GET", "/alice", Some("bob-key"), b"")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
