//! Source adapters over the SQLite stores

use clustermap_api::{SourceFact, SourceKind};
use clustermap_util::{hostname_from_ip, Hostname};
use std::sync::Arc;
use tracing::debug;

use crate::{ClusterDb, ExamDb, ExamSessionRow, SourceAdapter, StoreResult};

/// Ordinary sessions from the seat/session directory
pub struct SeatSessionAdapter {
    db: Arc<ClusterDb>,
    domain: Option<String>,
}

impl SeatSessionAdapter {
    pub fn new(db: Arc<ClusterDb>, domain: Option<String>) -> Self {
        Self { db, domain }
    }
}

impl SourceAdapter for SeatSessionAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::SeatSessions
    }

    fn fetch(&self) -> StoreResult<Vec<SourceFact>> {
        let rows = self.db.active_seats()?;
        let total = rows.len();

        let facts: Vec<SourceFact> = rows
            .into_iter()
            .filter_map(|row| {
                let hostname = row
                    .hostname
                    .as_deref()
                    .and_then(|h| Hostname::normalize(h, self.domain.as_deref()));
                match hostname {
                    Some(hostname) => Some(SourceFact::seat(row.login, hostname)),
                    None => {
                        debug!(login = %row.login, "Dropping seat session without a usable hostname");
                        None
                    }
                }
            })
            .collect();

        debug!(rows = total, facts = facts.len(), "Fetched seat sessions");
        Ok(facts)
    }

    fn is_healthy(&self) -> bool {
        self.db.is_healthy()
    }
}

/// Supervised sessions from the exam session directory
pub struct ExamSessionAdapter {
    db: Arc<ExamDb>,
    domain: Option<String>,
}

impl ExamSessionAdapter {
    pub fn new(db: Arc<ExamDb>, domain: Option<String>) -> Self {
        Self { db, domain }
    }

    /// Resolve the workstation an exam session runs on.
    ///
    /// A recorded hostname wins; the address is only consulted when no
    /// hostname was recorded at all.
    fn resolve_hostname(&self, row: &ExamSessionRow) -> Option<Hostname> {
        let raw = match row
            .last_known_hostname
            .as_deref()
            .filter(|h| !h.trim().is_empty())
        {
            Some(recorded) => recorded.to_string(),
            None => hostname_from_ip(row.last_known_ip.as_deref()?)?,
        };
        Hostname::normalize(&raw, self.domain.as_deref())
    }
}

impl SourceAdapter for ExamSessionAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::ExamSessions
    }

    fn fetch(&self) -> StoreResult<Vec<SourceFact>> {
        let rows = self.db.active_sessions()?;
        let total = rows.len();

        let mut facts = Vec::with_capacity(total);
        for row in rows {
            match self.resolve_hostname(&row) {
                Some(hostname) => facts.push(SourceFact::exam(row.username, hostname)),
                None => debug!(
                    username = %row.username,
                    ip = ?row.last_known_ip,
                    hostname = ?row.last_known_hostname,
                    "Dropping exam session without a usable hostname"
                ),
            }
        }

        debug!(rows = total, facts = facts.len(), "Fetched exam sessions");
        Ok(facts)
    }

    fn is_healthy(&self) -> bool {
        self.db.is_healthy()
    }
}

/// Dead workstations from the host health registry
pub struct HostHealthAdapter {
    db: Arc<ClusterDb>,
    domain: Option<String>,
}

impl HostHealthAdapter {
    pub fn new(db: Arc<ClusterDb>, domain: Option<String>) -> Self {
        Self { db, domain }
    }
}

impl SourceAdapter for HostHealthAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::HostHealth
    }

    fn fetch(&self) -> StoreResult<Vec<SourceFact>> {
        let rows = self.db.dead_workstations()?;
        let total = rows.len();

        let facts: Vec<SourceFact> = rows
            .into_iter()
            .filter_map(|row| {
                let hostname = row
                    .hostname
                    .as_deref()
                    .and_then(|h| Hostname::normalize(h, self.domain.as_deref()))?;
                Some(SourceFact::dead(hostname, row.alive))
            })
            .collect();

        if facts.len() < total {
            debug!(dropped = total - facts.len(), "Dropped workstations without a usable hostname");
        }
        debug!(rows = total, facts = facts.len(), "Fetched dead workstations");
        Ok(facts)
    }

    fn is_healthy(&self) -> bool {
        self.db.is_healthy()
    }
}
