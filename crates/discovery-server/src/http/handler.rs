use crate::http::{
    AppState,
    error::{ApiError, ApiResult},
};
use crate::telemetry::{
    increment_setup_failures, increment_teardowns, increment_tokens_issued, record_setup_duration,
};
use axum::{
    Form,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
};
use discovery::{Error, NamespaceStore, StoreError};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NewTokenParams {
    pub size: Option<String>,
}

/// Parses the `size` parameter. Absent or empty means `default`.
pub fn parse_size(raw: Option<&str>, default: u32) -> ApiResult<u32> {
    let raw = match raw {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };
    match raw.parse::<u32>() {
        Ok(0) => Err(ApiError::InvalidSize(
            "size must be a positive integer".to_owned(),
        )),
        Ok(size) => Ok(size),
        Err(e) => Err(ApiError::InvalidSize(format!("invalid size {raw:?}: {e}"))),
    }
}

/// Issues a new discovery token and responds with its URL as plain text.
#[tracing::instrument(skip_all)]
pub async fn new_token<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<NewTokenParams>,
) -> ApiResult<String>
where
    S: NamespaceStore + 'static,
{
    issue(&state, params.size.as_deref()).await
}

/// `POST /new`: like [`new_token`], but a form-encoded `size` in the body
/// takes precedence over the query string.
#[tracing::instrument(skip_all)]
pub async fn new_token_form<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<NewTokenParams>,
    form: Result<Form<NewTokenParams>, FormRejection>,
) -> ApiResult<String>
where
    S: NamespaceStore + 'static,
{
    let size = match form {
        Ok(Form(NewTokenParams { size: Some(size) })) => Some(size),
        Ok(_) | Err(FormRejection::InvalidFormContentType(_)) => query.size,
        Err(e) => return Err(ApiError::InvalidSize(e.body_text())),
    };
    issue(&state, size.as_deref()).await
}

async fn issue<S>(state: &AppState<S>, raw_size: Option<&str>) -> ApiResult<String>
where
    S: NamespaceStore + 'static,
{
    let size = parse_size(raw_size, state.default_size)?;

    let start = std::time::Instant::now();
    let result = state.manager.setup(size).await;
    record_setup_duration(start.elapsed().as_secs_f64() * 1000.0);

    let token = result.map_err(|e| {
        increment_setup_failures();
        ApiError::Setup(e)
    })?;
    increment_tokens_issued();

    Ok(state.discovery_url.compose(&token))
}

/// Tears down the namespace of `token`.
#[tracing::instrument(skip_all)]
pub async fn delete_token<S>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> ApiResult<StatusCode>
where
    S: NamespaceStore + 'static,
{
    match state.manager.teardown(&token).await {
        Ok(()) => {
            increment_teardowns();
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e @ Error::InvalidArgument { .. }) => Err(ApiError::InvalidToken(e)),
        Err(e) if matches!(e.store_error(), Some(StoreError::NotFound(_))) => {
            Err(ApiError::TokenNotFound(e))
        }
        Err(e) => Err(ApiError::Teardown(e)),
    }
}

pub async fn health() -> &'static str {
    "OK"
}
