//! Oracle trait definitions

use async_trait::async_trait;
use clustermap_util::Hostname;
use std::time::Duration;
use thiserror::Error;

/// Reasons an oracle request produced no usable answer
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Oracle reported an error: {0}")]
    Reported(String),

    #[error("Client setup failed: {0}")]
    Setup(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

/// Source of the hostnames currently under exam lockdown
#[async_trait]
pub trait ExamModeOracle: Send + Sync {
    /// Hostnames in exam mode.
    ///
    /// Never fails: any problem reaching or understanding the oracle yields
    /// an empty list.
    async fn fetch_exam_mode_hostnames(&self) -> Vec<Hostname>;

    /// Whether this oracle queries anything at all
    fn is_enabled(&self) -> bool {
        true
    }
}
