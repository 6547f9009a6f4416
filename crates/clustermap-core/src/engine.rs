//! Aggregation pipeline

use chrono::Local;
use clustermap_api::{HealthStatus, LocationRecord, SourceFact, SourceHealth, SourceKind};
use clustermap_oracle::ExamModeOracle;
use clustermap_store::{SourceAdapter, StoreError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{Reconciler, ResultCache, SourceSnapshot, RESPONSE_CACHE_KEY};

/// A reconciled occupancy list, shared between the cache and responses
pub type Occupancy = Arc<Vec<LocationRecord>>;

/// Errors that fail a whole aggregation pass
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Source {kind} unavailable: {error}")]
    SourceUnavailable {
        kind: SourceKind,
        #[source]
        error: StoreError,
    },

    #[error("Source {kind} task failed: {message}")]
    TaskFailed { kind: SourceKind, message: String },
}

pub type AggregateResult<T> = Result<T, AggregateError>;

/// The three stores every pass reads
#[derive(Clone)]
pub struct PresenceSources {
    pub seats: Arc<dyn SourceAdapter>,
    pub exams: Arc<dyn SourceAdapter>,
    pub hosts: Arc<dyn SourceAdapter>,
}

impl PresenceSources {
    fn all(&self) -> [&Arc<dyn SourceAdapter>; 3] {
        [&self.seats, &self.exams, &self.hosts]
    }
}

/// Presence aggregation engine: sources and oracle in, cached occupancy out
pub struct PresenceEngine {
    sources: PresenceSources,
    oracle: Arc<dyn ExamModeOracle>,
    reconciler: Reconciler,
    cache: ResultCache<Occupancy>,
    ttl: Duration,
}

impl PresenceEngine {
    pub fn new(
        sources: PresenceSources,
        oracle: Arc<dyn ExamModeOracle>,
        reconciler: Reconciler,
        cache: ResultCache<Occupancy>,
        ttl: Duration,
    ) -> Self {
        info!(
            ttl_ms = ttl.as_millis() as u64,
            oracle_enabled = oracle.is_enabled(),
            exam_session_conflict = ?reconciler.policy().exam_session_conflict,
            "Presence engine initialized"
        );

        Self {
            sources,
            oracle,
            reconciler,
            cache,
            ttl,
        }
    }

    /// Current occupancy, from the cache when fresh.
    ///
    /// A miss runs one full pass and stores its result. Failed passes are
    /// never cached.
    pub async fn snapshot(&self) -> AggregateResult<Occupancy> {
        if let Some(cached) = self.cache.get(RESPONSE_CACHE_KEY) {
            debug!(records = cached.len(), "Serving occupancy from cache");
            return Ok(cached);
        }

        let occupancy = Arc::new(self.run_pipeline().await?);
        self.cache
            .set(RESPONSE_CACHE_KEY, occupancy.clone(), self.ttl);
        Ok(occupancy)
    }

    /// Run one uncached pass: query every source and the oracle
    /// concurrently, then reconcile.
    pub async fn run_pipeline(&self) -> AggregateResult<Vec<LocationRecord>> {
        let started = Instant::now();

        let (seats, exams, dead_hosts, exam_mode_hosts) = tokio::join!(
            fetch_source(self.sources.seats.clone()),
            fetch_source(self.sources.exams.clone()),
            fetch_source(self.sources.hosts.clone()),
            self.oracle.fetch_exam_mode_hostnames(),
        );

        let snapshot = match (seats, exams, dead_hosts) {
            (Ok(seats), Ok(exams), Ok(dead_hosts)) => SourceSnapshot {
                seats,
                exams,
                dead_hosts,
                exam_mode_hosts,
            },
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                error!(error = %e, "Aggregation pass failed");
                return Err(e);
            }
        };

        let reconciled = self.reconciler.reconcile(snapshot);
        let stats = reconciled.stats;
        info!(
            records = reconciled.records.len(),
            seats = stats.seats_added,
            seats_duplicate = stats.seats_duplicate,
            exams = stats.exams_added,
            exams_overwritten = stats.exams_overwritten,
            exams_ignored = stats.exams_ignored,
            dead_added = stats.dead_added,
            dead_overlaid = stats.dead_overlaid,
            oracle_added = stats.oracle_added,
            oracle_overlaid = stats.oracle_overlaid,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation pass complete"
        );

        Ok(reconciled.records)
    }

    /// Probe every source store
    pub async fn health(&self) -> HealthStatus {
        let sources = self.sources.clone();
        let probes = tokio::task::spawn_blocking(move || {
            sources
                .all()
                .iter()
                .map(|adapter| SourceHealth {
                    source: adapter.kind(),
                    ok: adapter.is_healthy(),
                })
                .collect::<Vec<_>>()
        })
        .await;

        let sources = match probes {
            Ok(sources) => sources,
            Err(e) => {
                error!(error = %e, "Health probe task failed");
                self.sources
                    .all()
                    .iter()
                    .map(|adapter| SourceHealth {
                        source: adapter.kind(),
                        ok: false,
                    })
                    .collect()
            }
        };

        let all_ok = sources.iter().all(|s| s.ok);
        HealthStatus {
            status: if all_ok { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checked_at: Local::now(),
            sources,
            oracle_enabled: self.oracle.is_enabled(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

async fn fetch_source(adapter: Arc<dyn SourceAdapter>) -> AggregateResult<Vec<SourceFact>> {
    let kind = adapter.kind();
    tokio::task::spawn_blocking(move || adapter.fetch())
        .await
        .map_err(|e| AggregateError::TaskFailed {
            kind,
            message: e.to_string(),
        })?
        .map_err(|error| AggregateError::SourceUnavailable { kind, error })
}
