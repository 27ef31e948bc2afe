//! Adapters implementing the domain ports.

pub mod advisor;
pub mod in_memory;
pub mod metrics;
