//! Domain types and the ports the routing engine talks through.

pub mod config;
pub mod decision;
pub mod network;
pub mod ports;
pub mod query;
pub mod session;
pub mod transaction;
