//! Raw configuration schema (as parsed from TOML)

use clustermap_api::ExamSessionConflict;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub cache: RawCacheConfig,

    #[serde(default)]
    pub oracle: RawOracleConfig,

    #[serde(default)]
    pub sources: RawSourcesConfig,

    #[serde(default)]
    pub reconcile: RawReconcileConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServerConfig {
    /// Socket address to bind (default: 0.0.0.0:3000)
    pub listen: Option<String>,

    /// Prefix all routes are mounted under, e.g. "/clustermap"
    pub base_path: Option<String>,
}

/// Result cache settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCacheConfig {
    /// How long a reconciled report is served before recomputing
    pub response_ttl_seconds: Option<u64>,
}

/// Exam-mode oracle settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawOracleConfig {
    /// Base URL of the oracle; an empty string disables it
    pub base_url: Option<String>,

    /// Deadline for the whole oracle request
    pub timeout_ms: Option<u64>,

    /// Bearer token sent to the oracle
    pub token: Option<String>,
}

/// Source store settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSourcesConfig {
    /// SQLite database holding seat sessions and workstation health
    pub cluster_db: Option<PathBuf>,

    /// SQLite database holding exam sessions
    pub exam_db: Option<PathBuf>,

    /// Domain appended to short hostnames; an empty string disables it
    pub domain: Option<String>,
}

/// Reconciliation policy
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawReconcileConfig {
    pub exam_session_conflict: Option<ExamSessionConflict>,
}
