// Optional DockerRepo tests when Docker daemon is available

use dockerstats_agent::collector::Collector;
use dockerstats_agent::config::DockerConfig;
use dockerstats_agent::docker_repo::{ContainerRuntime, DockerRepo};
use std::sync::Arc;

#[tokio::test]
async fn docker_repo_connect_and_snapshot() {
    let repo = match DockerRepo::connect(&DockerConfig::default()) {
        Ok(r) => Arc::new(r),
        Err(_) => return, // Skip when Docker is not available (e.g. CI without Docker)
    };
    let containers = match repo.list_containers(true).await {
        Ok(c) => c,
        Err(_) => return, // Socket present but daemon not answering
    };
    let metrics = Collector::new(repo).snapshot_concurrent().await;
    // Cardinality may drift if containers come and go between the two listings.
    let _ = (containers, metrics);
}
