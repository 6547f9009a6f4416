//! Presence aggregation core for clustermap
//!
//! This crate turns the raw facts reported by the source adapters and the
//! exam-mode oracle into one occupancy report:
//! - Reconciliation (dedup by hostname, oracle > dead > exam > seat)
//! - Result caching with an injected clock
//! - The aggregation pipeline tying sources, oracle, engine and cache together

mod cache;
mod engine;
mod reconcile;

pub use cache::*;
pub use engine::*;
pub use reconcile::*;
