// Docker container models

use bollard::models::ContainerSummary;
use serde::{Deserialize, Serialize};

/// Length of the truncated id shown to clients (same as `docker ps`).
pub const SHORT_ID_LEN: usize = 12;

/// Identity of one container, re-derived from the runtime on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub id: String,
    pub short_id: String,
    /// Every name, each without its leading '/', joined with ','.
    pub name: String,
    /// The first name alone, as listed by `GET /containers`.
    pub primary_name: String,
}

impl ContainerIdentity {
    pub fn new(id: impl Into<String>, names: &[String]) -> Self {
        let id = id.into();
        Self {
            short_id: short_id(&id).to_string(),
            name: display_name(names),
            primary_name: names
                .first()
                .map(|n| strip_separator(n).to_string())
                .unwrap_or_default(),
            id,
        }
    }

    /// Build from a Docker list entry. Missing id or names become empty strings.
    pub fn from_summary(summary: &ContainerSummary) -> Self {
        let id = summary.id.clone().unwrap_or_default();
        let names = summary.names.as_deref().unwrap_or_default();
        Self::new(id, names)
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn strip_separator(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Docker reports names as "/name"; each name loses one leading '/', then names are joined with ','.
fn display_name(names: &[String]) -> String {
    names
        .iter()
        .map(|n| strip_separator(n))
        .collect::<Vec<_>>()
        .join(",")
}

/// Display-ready metrics for one container. Every numeric field is pre-formatted.
///
/// JSON keys follow the dashboard's wire format (`id`, `cpuUsage`, `memAvailable`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetrics {
    #[serde(rename = "id")]
    pub short_id: String,
    pub name: String,
    #[serde(rename = "cpuUsage")]
    pub cpu_percent: String,
    #[serde(rename = "memUsed")]
    pub mem_used: String,
    #[serde(rename = "memAvailable")]
    pub mem_limit: String,
    #[serde(rename = "memUsage")]
    pub mem_percent: String,
    #[serde(rename = "netRead")]
    pub net_read: String,
    #[serde(rename = "netWrite")]
    pub net_write: String,
    #[serde(rename = "pids")]
    pub pid_count: String,
}

impl ContainerMetrics {
    /// Placeholder for a container whose stats could not be read. Unlike an all-zero record it
/// keeps the short id and name so clients can tell which container failed; metrics are empty.
    pub fn unavailable(identity: &ContainerIdentity) -> Self {
        Self {
            short_id: identity.short_id.clone(),
            name: identity.name.clone(),
            ..Default::default()
        }
    }
}

/// Entry of `GET /containers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerListing {
    pub id: String,
    pub name: String,
}

impl From<&ContainerIdentity> for ContainerListing {
    fn from(identity: &ContainerIdentity) -> Self {
        Self {
            id: identity.short_id.clone(),
            name: identity.primary_name.clone(),
        }
    }
}
