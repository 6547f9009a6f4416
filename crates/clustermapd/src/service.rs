//! Service wiring

use anyhow::{Context, Result};
use clustermap_config::{
    parse_listen, validate_domain, validate_oracle_url, Settings, ValidationError,
};
use clustermap_core::{
    PresenceEngine, PresenceSources, ReconcilePolicy, Reconciler, ResultCache,
};
use clustermap_oracle::{DisabledOracle, ExamModeOracle, HttpOracle, OracleConfig};
use clustermap_store::{
    ClusterDb, ExamDb, ExamSessionAdapter, HostHealthAdapter, SeatSessionAdapter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line and environment values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub oracle_url: Option<String>,
    pub oracle_token: Option<String>,
    pub cluster_db: Option<PathBuf>,
    pub exam_db: Option<PathBuf>,
    /// Empty string leaves short hostnames unqualified
    pub domain: Option<String>,
}

impl Overrides {
    /// Apply the overrides, validating them like their file counterparts
    pub fn apply(self, settings: &mut Settings) -> Result<(), ValidationError> {
        if let Some(listen) = self.listen {
            settings.server.listen =
                parse_listen(&listen).map_err(|message| ValidationError::InvalidListenAddress {
                    value: listen.clone(),
                    message,
                })?;
        }

        if let Some(url) = self.oracle_url {
            if url.is_empty() {
                settings.oracle.base_url = None;
            } else {
                validate_oracle_url(&url).map_err(|message| ValidationError::InvalidOracleUrl {
                    value: url.clone(),
                    message,
                })?;
                settings.oracle.base_url = Some(url);
            }
        }

        if let Some(token) = self.oracle_token {
            settings.oracle.token = Some(token);
        }
        if let Some(path) = self.cluster_db {
            settings.sources.cluster_db = path;
        }
        if let Some(path) = self.exam_db {
            settings.sources.exam_db = path;
        }

        if let Some(domain) = self.domain {
            if domain.is_empty() {
                settings.sources.domain = None;
            } else {
                validate_domain(&domain).map_err(|message| ValidationError::InvalidDomain {
                    value: domain.clone(),
                    message,
                })?;
                settings.sources.domain = Some(domain);
            }
        }

        Ok(())
    }
}

/// Open the source stores and assemble the presence engine
pub fn build_engine(settings: &Settings) -> Result<PresenceEngine> {
    let domain = settings.sources.domain.clone();

    let cluster_db = Arc::new(
        ClusterDb::open(&settings.sources.cluster_db).with_context(|| {
            format!(
                "Failed to open cluster database {:?}",
                settings.sources.cluster_db
            )
        })?,
    );
    let exam_db = Arc::new(ExamDb::open(&settings.sources.exam_db).with_context(|| {
        format!("Failed to open exam database {:?}", settings.sources.exam_db)
    })?);

    info!(
        cluster_db = %settings.sources.cluster_db.display(),
        exam_db = %settings.sources.exam_db.display(),
        "Source stores opened"
    );

    let sources = PresenceSources {
        seats: Arc::new(SeatSessionAdapter::new(cluster_db.clone(), domain.clone())),
        exams: Arc::new(ExamSessionAdapter::new(exam_db, domain.clone())),
        hosts: Arc::new(HostHealthAdapter::new(cluster_db, domain.clone())),
    };

    let oracle = build_oracle(settings)?;
    let reconciler = Reconciler::new(ReconcilePolicy {
        exam_session_conflict: settings.reconcile.exam_session_conflict,
    });

    Ok(PresenceEngine::new(
        sources,
        oracle,
        reconciler,
        ResultCache::with_system_clock(),
        settings.cache.response_ttl,
    ))
}

fn build_oracle(settings: &Settings) -> Result<Arc<dyn ExamModeOracle>> {
    let Some(base_url) = settings.oracle.base_url.clone() else {
        info!("No oracle URL configured, exam-mode overlay disabled");
        return Ok(Arc::new(DisabledOracle));
    };

    let oracle = HttpOracle::new(OracleConfig {
        base_url,
        timeout: settings.oracle.timeout,
        token: settings.oracle.token.clone(),
        domain: settings.sources.domain.clone(),
    })
    .context("Failed to create oracle client")?;

    info!(
        url = %oracle.endpoint(),
        timeout_ms = settings.oracle.timeout.as_millis() as u64,
        authenticated = settings.oracle.token.is_some(),
        "Oracle client initialized"
    );
    Ok(Arc::new(oracle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut settings = Settings::default();
        Overrides {
            listen: Some("127.0.0.1:8080".into()),
            oracle_url: Some("https://oracle.example".into()),
            oracle_token: Some("s3cret".into()),
            cluster_db: Some("/tmp/c.db".into()),
            exam_db: None,
            domain: Some("example.org".into()),
        }
        .apply(&mut settings)
        .unwrap();

        assert_eq!(settings.server.listen.port(), 8080);
        assert_eq!(settings.oracle.base_url.as_deref(), Some("https://oracle.example"));
        assert_eq!(settings.oracle.token.as_deref(), Some("s3cret"));
        assert_eq!(settings.sources.cluster_db, PathBuf::from("/tmp/c.db"));
        assert_eq!(settings.oracle.timeout, Duration::from_secs(3));
        assert_eq!(settings.sources.domain.as_deref(), Some("example.org"));
    }

    #[test]
    fn test_empty_overrides_switch_features_off() {
        let mut settings = Settings::default();
        assert!(settings.oracle.is_enabled());
        assert!(settings.sources.domain.is_some());

        Overrides {
            oracle_url: Some(String::new()),
            domain: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut settings)
        .unwrap();

        assert!(!settings.oracle.is_enabled());
        assert!(settings.sources.domain.is_none());
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let mut settings = Settings::default();
        let err = Overrides {
            listen: Some("not-an-address".into()),
            ..Default::default()
        }
        .apply(&mut settings)
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidListenAddress { .. }));

        let err = Overrides {
            oracle_url: Some("ftp://oracle".into()),
            ..Default::default()
        }
        .apply(&mut settings)
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOracleUrl { .. }));

        let err = Overrides {
            domain: Some(".codam.nl".into()),
            ..Default::default()
        }
        .apply(&mut settings)
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDomain { .. }));
    }

    #[test]
    fn test_missing_database_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.sources.cluster_db = dir.path().join("missing.db");
        settings.sources.exam_db = dir.path().join("missing-exam.db");

        assert!(build_engine(&settings).is_err());
    }
}
