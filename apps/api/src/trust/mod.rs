// Trust/reputation aggregation.
// Everything except `cache`, `store` and `handlers` is pure and works on rows already loaded.

pub mod aggregation;
pub mod cache;
pub mod dedup;
pub mod graph;
pub mod handlers;
pub mod scoring;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;
