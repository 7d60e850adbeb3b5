// Container directory: which containers exist, and what to call them

use crate::docker_repo::{ContainerRuntime, RuntimeError};
use crate::models::ContainerIdentity;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct Directory {
    runtime: Arc<dyn ContainerRuntime>,
}

impl Directory {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// One runtime query; identities keep the runtime's order.
    pub async fn try_list(&self, include_stopped: bool) -> Result<Vec<ContainerIdentity>, RuntimeError> {
        let containers = self.runtime.list_containers(include_stopped).await?;
        Ok(containers.iter().map(ContainerIdentity::from_summary).collect())
    }

    /// Fail-open variant: a runtime failure is logged and reads as "no containers".
    pub async fn list(&self, include_stopped: bool) -> Vec<ContainerIdentity> {
        match self.try_list(include_stopped).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, operation = "list_containers", "Docker list_containers failed");
                Vec::new()
            }
        }
    }
}
