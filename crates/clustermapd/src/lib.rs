//! clustermapd - live occupancy service for a computer cluster
//!
//! The library half of the service, so the HTTP surface can be driven
//! in-process by tests:
//! - Router and request handlers
//! - API error mapping
//! - Wiring from validated settings to a running engine

mod error;
mod routes;
mod service;

pub use error::*;
pub use routes::*;
pub use service::*;
