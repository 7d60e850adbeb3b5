// Derived container metrics: percentages and human-readable byte sizes from raw counters

use crate::models::{ContainerIdentity, ContainerMetrics, RawStatsSample};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// CPU usage over the interval between the previous and current reading, scaled by core count.
/// A zero system delta (or zero cores) yields "0.00%".
pub fn cpu_percent(sample: &RawStatsSample) -> String {
    let cpu_delta = sample.cpu_usage.saturating_sub(sample.prev_cpu_usage);
    let system_delta = sample.system_usage.saturating_sub(sample.prev_system_usage);
    let cores = if sample.per_core_usage.is_empty() {
        u64::from(sample.online_cores)
    } else {
        sample.per_core_usage.len() as u64
    };
    let percent = if system_delta > 0 && cores > 0 {
        (cpu_delta as f64 / system_delta as f64) * cores as f64 * 100.0
    } else {
        0.0
    };
    format_percent(percent)
}

/// Memory usage as a share of the limit. A zero limit yields "0.00%".
pub fn mem_percent(sample: &RawStatsSample) -> String {
    let percent = if sample.memory_limit > 0 {
        sample.memory_usage as f64 / sample.memory_limit as f64 * 100.0
    } else {
        0.0
    };
    format_percent(percent)
}

fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Binary units up to GiB; larger values stay in GiB.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    }
}

/// Total (received, sent) bytes across every interface.
pub fn net_totals(sample: &RawStatsSample) -> (u64, u64) {
    sample.networks.values().fold((0, 0), |(rx, tx), n| {
        (rx.saturating_add(n.rx_bytes), tx.saturating_add(n.tx_bytes))
    })
}

/// Reduce one raw sample to the display record for `identity`.
pub fn reduce(identity: &ContainerIdentity, sample: &RawStatsSample) -> ContainerMetrics {
    let (net_read, net_write) = net_totals(sample);
    ContainerMetrics {
        short_id: identity.short_id.clone(),
        name: identity.name.clone(),
        cpu_percent: cpu_percent(sample),
        mem_used: format_bytes(sample.memory_usage),
        mem_limit: format_bytes(sample.memory_limit),
        mem_percent: mem_percent(sample),
        net_read: format_bytes(net_read),
        net_write: format_bytes(net_write),
        pid_count: sample.pids.to_string(),
    }
}
