//! Wire types for clustermap
//!
//! This crate defines the stable shapes shared between the aggregation
//! engine, its source adapters and the HTTP service:
//! - Location records (the occupancy report consumers poll)
//! - Source facts (adapter evidence before reconciliation)
//! - Health reporting

mod types;

pub use types::*;
