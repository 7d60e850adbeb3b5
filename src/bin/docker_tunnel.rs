// Exposes a remote host's Docker socket locally through an SSH tunnel.

use anyhow::Result;
use dockerstats_agent::config::AppConfig;
use dockerstats_agent::tunnel::{SshTransport, TunnelProxy};
use dockerstats_agent::{logging, signal};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let app_config = AppConfig::load()?;
    let tunnel = app_config.tunnel()?;

    let transport = SshTransport::connect(tunnel).await?;
    let proxy = TunnelProxy::bind(
        transport,
        &tunnel.local_socket_path,
        tunnel.remote_socket_path.clone(),
    )?;
    tracing::info!(
        local = %proxy.local_path().display(),
        "SSH tunnel established; point DOCKER_HOST at unix://{}",
        proxy.local_path().display()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        signal::shutdown_signal().await;
        shutdown_tx.send_replace(true);
    });

    proxy.run(shutdown_rx).await?;
    Ok(())
}
