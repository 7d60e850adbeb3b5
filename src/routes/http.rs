// GET handlers: pages, container list, container stats, version

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::models::ContainerListing;

/// Package name and version (from Cargo.toml).
const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Legacy request header some dashboards send instead of If-None-Match.
const LEGACY_ETAG_HEADER: &str = "etag";

pub(super) async fn index_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    page_response(&state, &headers, state.pages.index_html())
}

pub(super) async fn stats_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    page_response(&state, &headers, state.pages.stats_html())
}

fn page_response(state: &AppState, headers: &HeaderMap, body: &str) -> Response {
    let client_tag = headers
        .get(header::IF_NONE_MATCH)
        .or_else(|| headers.get(LEGACY_ETAG_HEADER))
        .and_then(|v| v.to_str().ok());
    let etag = state.pages.etag().to_string();
    if state.pages.is_fresh(client_tag) {
        return StatusCode::NOT_MODIFIED.into_response();
    }
    (
        [
            (header::ETAG, etag),
            (header::CONTENT_TYPE, "text/html".to_string()),
        ],
        body.to_string(),
    )
        .into_response()
}

/// GET /containers: every container (stopped included) as `{Id, Name}`.
pub(super) async fn containers(State(state): State<AppState>) -> Response {
    match state.collector.directory().try_list(true).await {
        Ok(list) => {
            let body: Vec<ContainerListing> = list.iter().map(ContainerListing::from).collect();
            Json(body).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "list_containers", "GET /containers failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /containerstats: metrics for every container, read concurrently.
pub(super) async fn container_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.collector.snapshot_concurrent().await)
}

/// GET /version: returns service name and version.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
