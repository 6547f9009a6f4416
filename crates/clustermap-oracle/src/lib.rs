//! Exam-mode oracle client for clustermap
//!
//! The oracle is a remote service listing the workstations currently placed
//! in exam lockdown. Its answer only enriches the occupancy report, so every
//! client here degrades to "no hosts in exam mode" instead of failing.

mod client;
mod mock;
mod traits;

pub use client::*;
pub use mock::*;
pub use traits::*;
