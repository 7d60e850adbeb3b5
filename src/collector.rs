// Telemetry collector: list containers, read their stats, reduce to display metrics

use crate::directory::Directory;
use crate::docker_repo::ContainerRuntime;
use crate::metrics;
use crate::models::{ContainerIdentity, ContainerMetrics};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct Collector {
    directory: Directory,
    runtime: Arc<dyn ContainerRuntime>,
}

impl Collector {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            directory: Directory::new(runtime.clone()),
            runtime,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Reads containers one after another; output follows the directory order.
    pub async fn snapshot(&self, include_stopped: bool) -> Vec<ContainerMetrics> {
        let containers = self.directory.list(include_stopped).await;
        let mut out = Vec::with_capacity(containers.len());
        for identity in &containers {
            out.push(self.container_metrics(identity).await);
        }
        out
    }

    /// Reads every container (stopped included) concurrently. Output is in completion order;
    /// there is exactly one entry per listed container.
    pub async fn snapshot_concurrent(&self) -> Vec<ContainerMetrics> {
        let containers = self.directory.list(true).await;
        let mut pending: FuturesUnordered<_> = containers
            .iter()
            .map(|identity| self.container_metrics(identity))
            .collect();
        let mut out = Vec::with_capacity(containers.len());
        while let Some(metrics) = pending.next().await {
            out.push(metrics);
        }
        out
    }

    /// A failed read becomes a placeholder so one bad container never hides the others.
    async fn container_metrics(&self, identity: &ContainerIdentity) -> ContainerMetrics {
        match self.runtime.read_stats(&identity.id).await {
            Ok(sample) => metrics::reduce(identity, &sample),
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "read_stats",
                    container = %identity.name,
                    "Container stats failed"
                );
                ContainerMetrics::unavailable(identity)
            }
        }
    }
}
