// Shared test helpers: an in-memory container runtime

#![allow(dead_code)]

use bollard::models::{ContainerSummary, EventMessage};
use dockerstats_agent::docker_repo::{ContainerRuntime, RuntimeError};
use dockerstats_agent::models::{NetworkCounters, RawStatsSample};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Containers and samples are fixed at construction; a container without a sample fails
/// its stats read. Events published with `publish` reach every live subscription.
pub struct FakeRuntime {
    containers: Vec<ContainerSummary>,
    samples: HashMap<String, RawStatsSample>,
    list_fails: bool,
    events: broadcast::Sender<EventMessage>,
    subscribe_calls: AtomicUsize,
    list_calls: Mutex<Vec<bool>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            containers: Vec::new(),
            samples: HashMap::new(),
            list_fails: false,
            events,
            subscribe_calls: AtomicUsize::new(0),
            list_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_container(mut self, id: &str, name: &str, sample: Option<RawStatsSample>) -> Self {
        self.containers.push(ContainerSummary {
            id: Some(id.to_string()),
            names: Some(vec![format!("/{}", name)]),
            ..Default::default()
        });
        if let Some(sample) = sample {
            self.samples.insert(id.to_string(), sample);
        }
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    pub fn publish(&self, action: &str) {
        let _ = self.events.send(EventMessage {
            action: Some(action.to_string()),
            ..Default::default()
        });
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Event streams that are still held by a relay.
    pub fn live_subscriptions(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn list_calls(&self) -> Vec<bool> {
        self.list_calls.lock().unwrap().clone()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn list_containers(&self, all: bool) -> BoxFuture<'_, Result<Vec<ContainerSummary>, RuntimeError>> {
        self.list_calls.lock().unwrap().push(all);
        let result = if self.list_fails {
            Err(RuntimeError::Docker(
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 500,
                    message: "daemon unavailable".into(),
                },
            ))
        } else {
            Ok(self.containers.clone())
        };
        async move { result }.boxed()
    }

    fn read_stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<RawStatsSample, RuntimeError>> {
        async move {
            self.samples
                .get(id)
                .cloned()
                .ok_or_else(|| RuntimeError::MalformedStats { id: id.to_string() })
        }
        .boxed()
    }

    fn subscribe_events(&self) -> BoxStream<'static, Result<EventMessage, RuntimeError>> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let rx = self.events.subscribe();
        futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.ok().map(|event| (Ok(event), rx))
        })
        .boxed()
    }
}

/// cpu 40.00%, memory 2.00 MiB of 4.00 MiB, 1.00 KiB in / 512 B out, 3 pids.
pub fn busy_sample() -> RawStatsSample {
    let mut networks = HashMap::new();
    networks.insert(
        "eth0".to_string(),
        NetworkCounters {
            rx_bytes: 1024,
            tx_bytes: 512,
        },
    );
    RawStatsSample {
        cpu_usage: 150,
        prev_cpu_usage: 100,
        system_usage: 1500,
        prev_system_usage: 1000,
        online_cores: 4,
        memory_usage: 2_097_152,
        memory_limit: 4_194_304,
        pids: 3,
        networks,
        ..Default::default()
    }
}

/// Polls `cond` every 10ms for up to 2s.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    cond()
}
