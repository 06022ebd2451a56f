//! Tests for `DELETE /{token}`.

mod common;

use axum::http::StatusCode;
use common::{TestServer, namespace, size_key};

#[tokio::test]
async fn teardown_route_is_absent_unless_enabled() {
    let server = TestServer::new(false);
    let token = server.issue(3).await;

    let (status, _) = server.send("DELETE", &format!("/{token}")).await;
    assert!(status.is_client_error(), "{status}");
    assert!(server.store.get(&namespace(&token)).is_some());
}

#[tokio::test]
async fn teardown_removes_namespace() {
    let server = TestServer::new(true);
    let token = server.issue(4).await;
    let other = server.issue(4).await;

    let (status, body) = server.send("DELETE", &format!("/{token}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{body}");
    assert!(server.store.get(&namespace(&token)).is_none());
    assert!(server.store.get(&size_key(&token)).is_none());

    // unrelated namespaces are untouched
    assert!(server.store.get(&size_key(&other)).is_some());
}

#[tokio::test]
async fn teardown_of_unknown_token_is_not_found() {
    let server = TestServer::new(true);
    let token = server.issue(3).await;
    server.send("DELETE", &format!("/{token}")).await;

    let (status, body) = server.send("DELETE", &format!("/{token}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Token not found");
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let server = TestServer::new(true);
    server.issue(3).await;
    let before = server.store.len();

    for uri in ["/health-check", "/ABCDEF", "/_etcd"] {
        let (status, body) = server.send("DELETE", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, "Invalid token");
    }
    assert_eq!(server.store.len(), before);
}
