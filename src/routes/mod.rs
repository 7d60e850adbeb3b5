// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::collector::Collector;
use crate::config::SessionConfig;
use crate::docker_repo::ContainerRuntime;
use crate::pages::PageCache;
use crate::session::SubscriptionSlot;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) runtime: Arc<dyn ContainerRuntime>,
    pub(crate) collector: Collector,
    pub(crate) subscriptions: Arc<SubscriptionSlot>,
    pub(crate) pages: Arc<PageCache>,
    pub(crate) session: SessionConfig,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    runtime: Arc<dyn ContainerRuntime>,
    subscriptions: Arc<SubscriptionSlot>,
    pages: Arc<PageCache>,
    session: SessionConfig,
) -> Router {
    let state = AppState {
        collector: Collector::new(runtime.clone()),
        runtime,
        subscriptions,
        pages,
        session,
        ws_connections: Arc::new(AtomicUsize::new(0)),
    };
    Router::new()
        .route("/", get(http::index_page)) // GET /
        .route("/stats", get(http::stats_page)) // GET /stats
        .route("/containers", get(http::containers)) // GET /containers
        .route("/containerstats", get(http::container_stats)) // GET /containerstats
        .route("/version", get(http::version_handler)) // GET /version
        .route("/ws", get(ws::ws_session)) // WS /ws
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
