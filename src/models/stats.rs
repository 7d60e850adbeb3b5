// Raw per-container counters as read from one Docker stats call

use std::collections::HashMap;

/// Cumulative byte counters for one network interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One stats reading. Docker supplies both the current and the previous CPU counters in a
/// single response, so no history is kept between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatsSample {
    pub cpu_usage: u64,
    pub prev_cpu_usage: u64,
    pub system_usage: u64,
    pub prev_system_usage: u64,
    /// Per-core usage; empty on cgroup v2 hosts, where `online_cores` is used instead.
    pub per_core_usage: Vec<u64>,
    pub online_cores: u32,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub pids: u64,
    pub networks: HashMap<String, NetworkCounters>,
}
