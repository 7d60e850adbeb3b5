use anyhow::Result;
use dockerstats_agent::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let app_config = config::AppConfig::load()?;
    let pages = Arc::new(pages::PageCache::load(&app_config.pages)?);
    let runtime: Arc<dyn docker_repo::ContainerRuntime> =
        Arc::new(docker_repo::DockerRepo::connect(&app_config.docker)?);
    let subscriptions = Arc::new(session::SubscriptionSlot::default());

    let app = routes::app(
        runtime,
        subscriptions.clone(),
        pages,
        app_config.session.clone(),
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(signal::shutdown_signal())
        .await?;

    if let Some(id) = subscriptions.active_id() {
        tracing::info!(subscription = id, "Cancelling event subscription");
    }
    subscriptions.cancel_current();
    tracing::info!("Server closed");
    Ok(())
}
