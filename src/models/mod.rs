// Domain models shared by the collector, the session protocol and the HTTP surface

mod container;
mod stats;

pub use container::{ContainerIdentity, ContainerListing, ContainerMetrics};
pub use stats::{NetworkCounters, RawStatsSample};
