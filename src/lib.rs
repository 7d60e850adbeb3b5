// Library for the agent and tunnel binaries (and tests)

pub mod collector;
pub mod config;
pub mod directory;
pub mod docker_repo;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pages;
pub mod routes;
pub mod session;
pub mod signal;
pub mod tunnel;
