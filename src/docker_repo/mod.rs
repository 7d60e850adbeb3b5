// Docker runtime access via bollard

mod stats;

use crate::config::DockerConfig;
use crate::models::RawStatsSample;
use bollard::Docker;
use bollard::query_parameters::{EventsOptions, ListContainersOptions, StatsOptions};
use bollard::models::{ContainerSummary, EventMessage};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};

/// Seconds before a request to the Docker socket is abandoned.
const DOCKER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("docker: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("no stats returned for container {id}")]
    NoStats { id: String },
    #[error("malformed stats payload for container {id}")]
    MalformedStats { id: String },
}

/// The container runtime as seen by the agent. Every call may fail.
pub trait ContainerRuntime: Send + Sync {
    /// Running containers, or every container when `all` is set.
    fn list_containers(&self, all: bool) -> BoxFuture<'_, Result<Vec<ContainerSummary>, RuntimeError>>;

    /// One stats reading carrying both current and previous counters.
    fn read_stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<RawStatsSample, RuntimeError>>;

    /// Live runtime events. The subscription ends when the stream is dropped.
    fn subscribe_events(&self) -> BoxStream<'static, Result<EventMessage, RuntimeError>>;
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// Connects to `config.socket` when set, otherwise to the local defaults (honours DOCKER_HOST).
    pub fn connect(config: &DockerConfig) -> anyhow::Result<Self> {
        let docker = match config.socket.as_deref() {
            Some(path) => {
                Docker::connect_with_unix(path, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?
            }
            None => Docker::connect_with_unix_defaults()?,
        };
        Ok(Self { docker })
    }
}

impl ContainerRuntime for DockerRepo {
    fn list_containers(&self, all: bool) -> BoxFuture<'_, Result<Vec<ContainerSummary>, RuntimeError>> {
        async move {
            let options = ListContainersOptions {
                all,
                ..Default::default()
            };
            Ok(self.docker.list_containers(Some(options)).await?)
        }
        .boxed()
    }

    fn read_stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<RawStatsSample, RuntimeError>> {
        async move {
            let options = StatsOptions {
                stream: false,
                ..Default::default()
            };
            let response = self
                .docker
                .stats(id, Some(options))
                .next()
                .await
                .ok_or_else(|| RuntimeError::NoStats { id: id.to_string() })??;
            stats::decode_sample(&response).ok_or_else(|| RuntimeError::MalformedStats {
                id: id.to_string(),
            })
        }
        .boxed()
    }

    fn subscribe_events(&self) -> BoxStream<'static, Result<EventMessage, RuntimeError>> {
        self.docker
            .events(Some(EventsOptions::default()))
            .map(|r| r.map_err(RuntimeError::from))
            .boxed()
    }
}
