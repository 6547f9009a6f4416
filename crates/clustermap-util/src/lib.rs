//! Shared utilities for clustermap
//!
//! This crate provides:
//! - The `Hostname` type and workstation address conventions
//! - Monotonic time and injectable clocks
//! - Default paths for config and source databases

mod hostname;
mod paths;
mod time;

pub use hostname::*;
pub use paths::*;
pub use time::*;
