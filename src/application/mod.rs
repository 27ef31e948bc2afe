//! Application layer containing the routing logic.
//!
//! `RoutingEngine` is the entry point: it gathers inputs through the domain
//! ports, ranks candidates with the pure `HeuristicScorer`, merges in the AI
//! advisor's answer through the combiner and records the outcome.

pub mod combiner;
pub mod engine;
pub mod scorer;
