use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    /// Only the tunnel binary needs this section.
    pub tunnel: Option<TunnelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            stats_path: default_stats_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    "./index.html".into()
}

fn default_stats_path() -> PathBuf {
    "./stats.html".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// How often /ws clients are pinged.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Max time to wait for a send before treating the client as dead.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_send_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerConfig {
    /// Unix socket of the Docker API, e.g. the tunnel's local socket. Defaults to DOCKER_HOST / the local daemon.
    pub socket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    pub remote_host: String,
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    pub key_path: PathBuf,
    #[serde(default = "default_local_socket_path")]
    pub local_socket_path: PathBuf,
    #[serde(default = "default_remote_socket_path")]
    pub remote_socket_path: String,
    /// Require the server key to be listed in known_hosts.
    #[serde(default)]
    pub verify_host_key: bool,
}

fn default_remote_port() -> u16 {
    22
}

fn default_user() -> String {
    "root".into()
}

fn default_local_socket_path() -> PathBuf {
    "/tmp/docker.sock".into()
}

fn default_remote_socket_path() -> String {
    "/var/run/docker.sock".into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// The `[tunnel]` section, required by the tunnel binary.
    pub fn tunnel(&self) -> anyhow::Result<&TunnelConfig> {
        self.tunnel
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("missing [tunnel] section in config"))
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            !self.pages.index_path.as_os_str().is_empty(),
            "pages.index_path must be non-empty"
        );
        anyhow::ensure!(
            !self.pages.stats_path.as_os_str().is_empty(),
            "pages.stats_path must be non-empty"
        );
        anyhow::ensure!(
            self.session.ping_interval_secs > 0,
            "session.ping_interval_secs must be > 0, got {}",
            self.session.ping_interval_secs
        );
        anyhow::ensure!(
            self.session.send_timeout_secs > 0,
            "session.send_timeout_secs must be > 0, got {}",
            self.session.send_timeout_secs
        );
        if let Some(socket) = &self.docker.socket {
            anyhow::ensure!(!socket.is_empty(), "docker.socket must be non-empty when set");
        }
        if let Some(tunnel) = &self.tunnel {
            tunnel.validate()?;
        }
        Ok(())
    }
}

impl TunnelConfig {
    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.remote_host.is_empty(),
            "tunnel.remote_host must be non-empty"
        );
        anyhow::ensure!(
            self.remote_port > 0,
            "tunnel.remote_port must be between 1 and 65535, got {}",
            self.remote_port
        );
        anyhow::ensure!(!self.user.is_empty(), "tunnel.user must be non-empty");
        anyhow::ensure!(
            !self.key_path.as_os_str().is_empty(),
            "tunnel.key_path must be non-empty"
        );
        anyhow::ensure!(
            !self.local_socket_path.as_os_str().is_empty(),
            "tunnel.local_socket_path must be non-empty"
        );
        anyhow::ensure!(
            !self.remote_socket_path.is_empty(),
            "tunnel.remote_socket_path must be non-empty"
        );
        Ok(())
    }
}
