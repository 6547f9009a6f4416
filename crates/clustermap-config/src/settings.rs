//! Validated settings structures

use crate::schema::{
    RawCacheConfig, RawConfig, RawOracleConfig, RawReconcileConfig, RawServerConfig,
    RawSourcesConfig,
};
use crate::validation::parse_listen;
use clustermap_api::ExamSessionConflict;
use clustermap_util::{default_data_dir, CLUSTER_DB_FILENAME, EXAM_DB_FILENAME};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default lifetime of a cached report
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(5);

/// Default deadline for the exam-mode oracle request
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default exam-mode oracle
pub const DEFAULT_ORACLE_URL: &str = "https://clusterdata.codam.nl";

/// Default domain appended to short hostnames
pub const DEFAULT_DOMAIN: &str = "codam.nl";

/// An empty string in the file switches an optional feature off
fn unless_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Validated settings ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub oracle: OracleSettings,
    pub sources: SourceSettings,
    pub reconcile: ReconcileSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            server: ServerSettings::from_raw(raw.server),
            cache: CacheSettings::from_raw(raw.cache),
            oracle: OracleSettings::from_raw(raw.oracle),
            sources: SourceSettings::from_raw(raw.sources),
            reconcile: ReconcileSettings::from_raw(raw.reconcile),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    /// Empty, or a path prefix like "/clustermap"
    pub base_path: String,
}

impl ServerSettings {
    fn from_raw(raw: RawServerConfig) -> Self {
        let defaults = Self::default();
        Self {
            listen: raw
                .listen
                .and_then(|s| parse_listen(&s).ok())
                .unwrap_or(defaults.listen),
            base_path: raw.base_path.unwrap_or(defaults.base_path),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            base_path: String::new(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub response_ttl: Duration,
}

impl CacheSettings {
    fn from_raw(raw: RawCacheConfig) -> Self {
        Self {
            response_ttl: raw
                .response_ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RESPONSE_TTL),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            response_ttl: DEFAULT_RESPONSE_TTL,
        }
    }
}

/// Exam-mode oracle settings
#[derive(Debug, Clone)]
pub struct OracleSettings {
    /// None disables the oracle
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub token: Option<String>,
}

impl OracleSettings {
    fn from_raw(raw: RawOracleConfig) -> Self {
        Self {
            base_url: match raw.base_url {
                Some(url) => unless_blank(url),
                None => Some(DEFAULT_ORACLE_URL.to_string()),
            },
            timeout: raw
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_ORACLE_TIMEOUT),
            token: raw.token,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_ORACLE_URL.to_string()),
            timeout: DEFAULT_ORACLE_TIMEOUT,
            token: None,
        }
    }
}

/// Source store settings
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub cluster_db: PathBuf,
    pub exam_db: PathBuf,
    /// Appended to short hostnames; None leaves them short
    pub domain: Option<String>,
}

impl SourceSettings {
    fn from_raw(raw: RawSourcesConfig) -> Self {
        let defaults = Self::default();
        Self {
            cluster_db: raw.cluster_db.unwrap_or(defaults.cluster_db),
            exam_db: raw.exam_db.unwrap_or(defaults.exam_db),
            domain: match raw.domain {
                Some(domain) => unless_blank(domain),
                None => defaults.domain,
            },
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            cluster_db: data_dir.join(CLUSTER_DB_FILENAME),
            exam_db: data_dir.join(EXAM_DB_FILENAME),
            domain: Some(DEFAULT_DOMAIN.to_string()),
        }
    }
}

/// Reconciliation policy settings
#[derive(Debug, Clone, Default)]
pub struct ReconcileSettings {
    pub exam_session_conflict: ExamSessionConflict,
}

impl ReconcileSettings {
    fn from_raw(raw: RawReconcileConfig) -> Self {
        Self {
            exam_session_conflict: raw.exam_session_conflict.unwrap_or_default(),
        }
    }
}
