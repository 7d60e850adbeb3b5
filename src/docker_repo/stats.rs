// Decode a raw Docker stats API response into a RawStatsSample.

use crate::models::{NetworkCounters, RawStatsSample};
use bollard::models::ContainerStatsResponse;

/// Returns None when the CPU sections needed for a delta are missing (malformed payload).
/// Missing scalar counters default to 0.
pub(crate) fn decode_sample(s: &ContainerStatsResponse) -> Option<RawStatsSample> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let networks = s
        .networks
        .as_ref()
        .map(|n| {
            n.iter()
                .map(|(iface, v)| {
                    let counters = NetworkCounters {
                        rx_bytes: v.rx_bytes.unwrap_or(0),
                        tx_bytes: v.tx_bytes.unwrap_or(0),
                    };
                    (iface.clone(), counters)
                })
                .collect()
        })
        .unwrap_or_default();

    Some(RawStatsSample {
        cpu_usage: cpu_usage.total_usage.unwrap_or(0),
        prev_cpu_usage: precpu_usage.total_usage.unwrap_or(0),
        system_usage: cpu_stats.system_cpu_usage.unwrap_or(0),
        prev_system_usage: precpu_stats.system_cpu_usage.unwrap_or(0),
        per_core_usage: cpu_usage.percpu_usage.clone().unwrap_or_default(),
        online_cores: cpu_stats.online_cpus.unwrap_or(0),
        memory_usage: s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0),
        memory_limit: s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0),
        pids: s.pids_stats.as_ref().and_then(|p| p.current).unwrap_or(0),
        networks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats, ContainerNetworkStats,
        ContainerPidsStats, ContainerStatsResponse,
    };
    use std::collections::HashMap;

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn decode_sample_returns_none_when_cpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        assert!(decode_sample(&s).is_none());
    }

    #[test]
    fn decode_sample_returns_none_when_precpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        assert!(decode_sample(&s).is_none());
    }

    #[test]
    fn decode_sample_reads_every_counter() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(ContainerCpuStats {
                cpu_usage: Some(ContainerCpuUsage {
                    total_usage: Some(100_000_000),
                    percpu_usage: Some(vec![60_000_000, 40_000_000]),
                    ..Default::default()
                }),
                system_cpu_usage: Some(1_000_000_000),
                online_cpus: Some(2),
                throttling_data: None,
            }),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                ..Default::default()
            }),
            networks: Some({
                let mut m = HashMap::new();
                m.insert(
                    "eth0".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(1000),
                        tx_bytes: Some(2000),
                        ..Default::default()
                    },
                );
                m
            }),
            pids_stats: Some(ContainerPidsStats {
                current: Some(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = decode_sample(&s).unwrap();
        assert_eq!(out.cpu_usage, 100_000_000);
        assert_eq!(out.prev_cpu_usage, 50_000_000);
        assert_eq!(out.system_usage, 1_000_000_000);
        assert_eq!(out.prev_system_usage, 500_000_000);
        assert_eq!(out.per_core_usage.len(), 2);
        assert_eq!(out.online_cores, 2);
        assert_eq!(out.memory_usage, 256 * 1024 * 1024);
        assert_eq!(out.memory_limit, 512 * 1024 * 1024);
        assert_eq!(out.pids, 5);
        assert_eq!(out.networks["eth0"].rx_bytes, 1000);
        assert_eq!(out.networks["eth0"].tx_bytes, 2000);
    }

    #[test]
    fn decode_sample_defaults_missing_sections_to_zero() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 500)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)),
            ..Default::default()
        };
        let out = decode_sample(&s).unwrap();
        assert_eq!(out.memory_usage, 0);
        assert_eq!(out.memory_limit, 0);
        assert_eq!(out.pids, 0);
        assert!(out.networks.is_empty());
        assert!(out.per_core_usage.is_empty());
    }
}
