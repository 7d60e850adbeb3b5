// SSH transport via russh: public-key auth, direct-streamlocal channels to the remote socket

use super::{Transport, TunnelError};
use crate::config::TunnelConfig;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{ChannelStream, Disconnect};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Host key policy. Without verification any server key is accepted.
struct HostKeyPolicy {
    host: String,
    port: u16,
    verify: bool,
}

impl client::Handler for HostKeyPolicy {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        if !self.verify {
            return Ok(true);
        }
        match russh::keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(known) => {
                if !known {
                    warn!(host = %self.host, port = self.port, "Server key not in known_hosts");
                }
                Ok(known)
            }
            Err(e) => {
                warn!(error = %e, host = %self.host, "Server key check failed");
                Ok(false)
            }
        }
    }
}

pub struct SshTransport {
    handle: Handle<HostKeyPolicy>,
}

impl SshTransport {
    /// Loads the key, connects and authenticates. Every failure here is fatal for the tunnel.
    pub async fn connect(config: &TunnelConfig) -> Result<Self, TunnelError> {
        let key = load_secret_key(&config.key_path, None).map_err(|source| TunnelError::Key {
            path: config.key_path.clone(),
            source,
        })?;

        let ssh_config = Arc::new(client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });
        let policy = HostKeyPolicy {
            host: config.remote_host.clone(),
            port: config.remote_port,
            verify: config.verify_host_key,
        };
        let addr = format!("{}:{}", config.remote_host, config.remote_port);
        let connect_err = |source| TunnelError::Connect {
            addr: addr.clone(),
            source,
        };

        let mut handle = client::connect(
            ssh_config,
            (config.remote_host.as_str(), config.remote_port),
            policy,
        )
        .await
        .map_err(connect_err)?;

        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(connect_err)?
            .flatten();
        let auth = handle
            .authenticate_publickey(
                &config.user,
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await
            .map_err(connect_err)?;
        if !auth.success() {
            return Err(TunnelError::AuthRejected {
                user: config.user.clone(),
            });
        }

        info!(addr = %addr, user = %config.user, "SSH session established");
        Ok(Self { handle })
    }
}

impl Transport for SshTransport {
    type Channel = ChannelStream<Msg>;

    async fn open_channel(&self, remote_socket_path: &str) -> Result<Self::Channel, TunnelError> {
        match self
            .handle
            .channel_open_direct_streamlocal(remote_socket_path)
            .await
        {
            Ok(channel) => Ok(channel.into_stream()),
            Err(russh::Error::ChannelOpenFailure(reason)) => Err(TunnelError::ChannelRejected {
                path: remote_socket_path.to_string(),
                reason: format!("{:?}", reason),
            }),
            Err(e) => Err(TunnelError::TransportClosed(e.to_string())),
        }
    }

    async fn close(&self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "tunnel shutting down", "en")
            .await
        {
            debug!(error = %e, "SSH disconnect");
        }
    }
}
