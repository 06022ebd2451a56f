//! HTTP surface for token issuance.
//!
//! ## Routes
//!
//! - `GET|POST /new?size=<n>` - issue a token, respond with its discovery URL.
//!   A POST may carry `size` in a form-encoded body instead.
//! - `DELETE /{token}` - tear a namespace down (only when enabled).
//! - `GET /health` - liveness check.

pub mod error;
pub mod handler;

use axum::{
    Router,
    routing::{delete, get},
};
use discovery::{DiscoveryUrl, NamespaceStore, TokenManager};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every request.
///
/// Nothing here is mutated after startup; all coordination happens in the
/// store behind the [`TokenManager`].
pub struct AppState<S>
where
    S: NamespaceStore,
{
    pub manager: Arc<TokenManager<S>>,
    pub discovery_url: Arc<DiscoveryUrl>,
    pub default_size: u32,
}

impl<S> Clone for AppState<S>
where
    S: NamespaceStore,
{
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            discovery_url: Arc::clone(&self.discovery_url),
            default_size: self.default_size,
        }
    }
}

impl<S> AppState<S>
where
    S: NamespaceStore,
{
    pub fn new(manager: TokenManager<S>, discovery_url: DiscoveryUrl, default_size: u32) -> Self {
        Self {
            manager: Arc::new(manager),
            discovery_url: Arc::new(discovery_url),
            default_size,
        }
    }
}

/// Builds the application router.
pub fn router<S>(state: AppState<S>, allow_teardown: bool) -> Router
where
    S: NamespaceStore + 'static,
{
    let mut app = Router::new()
        .route(
            "/new",
            get(handler::new_token::<S>).post(handler::new_token_form::<S>),
        )
        .route("/health", get(handler::health));

    if allow_teardown {
        app = app.route("/{token}", delete(handler::delete_token::<S>));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
