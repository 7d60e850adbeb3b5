// Tunnel proxy: a local unix socket bridged to a remote Docker socket over an authenticated transport

mod relay;
mod ssh;

pub use relay::relay_pair;
pub use ssh::SshTransport;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("unable to read private key {path}: {source}")]
    Key {
        path: PathBuf,
        source: russh::keys::Error,
    },
    #[error("unable to connect to SSH server {addr}: {source}")]
    Connect { addr: String, source: russh::Error },
    #[error("SSH server rejected public key authentication for user {user}")]
    AuthRejected { user: String },
    #[error("unable to create local listener {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The remote refused this one channel; the transport itself is fine.
    #[error("unable to open channel to {path}: {reason}")]
    ChannelRejected { path: String, reason: String },
    /// The transport is gone; nothing more can reach the remote socket.
    #[error("transport closed: {0}")]
    TransportClosed(String),
}

impl TunnelError {
    /// Fatal errors stop the accept loop; the rest only cost one connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TunnelError::ChannelRejected { .. })
    }
}

/// An authenticated session that can open byte channels to a socket on the remote host.
pub trait Transport: Send + Sync + 'static {
    type Channel: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    fn open_channel(
        &self,
        remote_socket_path: &str,
    ) -> impl Future<Output = Result<Self::Channel, TunnelError>> + Send;

    /// Tears the session down; pending and future channel opens fail.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Lifecycle: `bind` (Starting) → `run` accepts (Running) → shutdown closes inputs and
/// waits for copies (Draining) → `run` returns (Stopped).
pub struct TunnelProxy<T: Transport> {
    transport: Arc<T>,
    listener: UnixListener,
    local_path: PathBuf,
    remote_socket_path: String,
}

impl<T: Transport> TunnelProxy<T> {
    /// Binds the local socket, replacing a stale socket file left by a previous run.
    pub fn bind(
        transport: T,
        local_path: impl Into<PathBuf>,
        remote_socket_path: impl Into<String>,
    ) -> Result<Self, TunnelError> {
        let local_path = local_path.into();
        if local_path.exists() {
            let _ = std::fs::remove_file(&local_path);
        }
        let listener = UnixListener::bind(&local_path).map_err(|source| TunnelError::Bind {
            path: local_path.clone(),
            source,
        })?;
        Ok(Self {
            transport: Arc::new(transport),
            listener,
            local_path,
            remote_socket_path: remote_socket_path.into(),
        })
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Serves until `shutdown` turns true (or its sender is dropped), then drains.
    /// Returns an error only when the transport failed fatally.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), TunnelError> {
        let TunnelProxy {
            transport,
            listener,
            local_path,
            remote_socket_path,
        } = self;
        let remote_socket_path: Arc<str> = remote_socket_path.into();
        let mut connections: JoinSet<Result<(), TunnelError>> = JoinSet::new();
        let mut next_conn: u64 = 0;

        info!(
            local = %local_path.display(),
            remote = %remote_socket_path,
            "Tunnel running"
        );

        let outcome = loop {
            tokio::select! {
                biased;
                changed = async { shutdown.wait_for(|stop| *stop).await.map(drop) } => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped");
                    }
                    break Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((local, _addr)) => {
                        next_conn += 1;
                        connections.spawn(serve_connection(
                            next_conn,
                            local,
                            transport.clone(),
                            remote_socket_path.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, operation = "accept", "Unable to accept connection");
                        // EMFILE and the like fail again immediately.
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    match joined {
                        Ok(Err(e)) if e.is_fatal() => break Err(e),
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Connection task panicked"),
                    }
                }
            }
        };

        info!(in_flight = connections.len(), "Tunnel draining");
        drop(listener);
        let _ = std::fs::remove_file(&local_path);
        transport.close().await;
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Connection task panicked");
            }
        }
        info!("Tunnel stopped");
        outcome
    }
}

/// Opens one remote channel for `local` and relays until either side closes.
async fn serve_connection<T: Transport>(
    conn: u64,
    local: UnixStream,
    transport: Arc<T>,
    remote_socket_path: Arc<str>,
) -> Result<(), TunnelError> {
    let remote = match transport.open_channel(&remote_socket_path).await {
        Ok(remote) => remote,
        Err(e) => {
            warn!(error = %e, conn, operation = "open_channel", "Unable to reach remote socket");
            return Err(e);
        }
    };
    let (sent, received) = relay_pair(local, remote).await;
    debug!(conn, bytes_sent = sent, bytes_received = received, "Connection closed");
    Ok(())
}
