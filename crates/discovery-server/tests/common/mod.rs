#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use discovery::{DiscoveryUrl, MemoryStore, NamespaceStore, Node, StoreError, TokenManager};
use discovery_server::http::{AppState, router};
use tower::ServiceExt;

pub const BASE_URL: &str = "https://discovery.example.com";

/// A router wired to a store the test can inspect.
pub struct TestServer<S = MemoryStore> {
    pub router: Router,
    pub store: S,
}

impl TestServer {
    pub fn new(allow_teardown: bool) -> Self {
        Self::with_store(MemoryStore::new(), allow_teardown)
    }
}

impl<S> TestServer<S>
where
    S: NamespaceStore + Clone + 'static,
{
    pub fn with_store(store: S, allow_teardown: bool) -> Self {
        let manager = TokenManager::new(store.clone());
        let discovery_url = DiscoveryUrl::resolve(Some(BASE_URL)).unwrap();
        let state = AppState::new(manager, discovery_url, 3);
        Self {
            router: router(state, allow_teardown),
            store,
        }
    }

    /// Sends a bodyless request and returns the status and body text.
    pub async fn send(&self, method: &str, uri: &str) -> (StatusCode, String) {
        send(&self.router, method, uri).await
    }

    /// Issues a token and returns it, panicking on failure.
    pub async fn issue(&self, size: u32) -> String {
        let (status, body) = self.send("GET", &format!("/new?size={size}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body.strip_prefix(&format!("{BASE_URL}/"))
            .unwrap_or_else(|| panic!("unexpected URL: {body}"))
            .to_owned()
    }
}

/// Sends a bodyless request to `router` and returns the status and body text.
pub async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    respond(router, request).await
}

/// POSTs a form-encoded `body` to `router`.
pub async fn post_form(router: &Router, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap();
    respond(router, request).await
}

async fn respond(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub fn namespace(token: &str) -> String {
    format!("/_etcd/registry/{token}")
}

pub fn size_key(token: &str) -> String {
    format!("/_etcd/registry/{token}/_config/size")
}

pub const STORE_FAILURE: &str = "etcd at 10.0.0.7:2379 unreachable";

/// A store whose every operation fails with a backend error.
#[derive(Clone, Debug, Default)]
pub struct UnavailableStore;

impl NamespaceStore for UnavailableStore {
    async fn create_dir(&self, _path: &str) -> Result<Node, StoreError> {
        Err(StoreError::Backend(STORE_FAILURE.into()))
    }

    async fn create_key(
        &self,
        _dir: &str,
        _relative: &str,
        _value: &str,
    ) -> Result<Node, StoreError> {
        Err(StoreError::Backend(STORE_FAILURE.into()))
    }

    async fn delete_recursive(&self, _path: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend(STORE_FAILURE.into()))
    }
}
