//! Shared types for the clustermap API

use chrono::{DateTime, Local};
use clustermap_util::Hostname;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a workstation is currently used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Ordinary login session
    Normal,
    /// Supervised exam session or exam lockdown
    Exam,
    /// Hardware known to be dead
    Dead,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Normal => write!(f, "normal"),
            SessionType::Exam => write!(f, "exam"),
            SessionType::Dead => write!(f, "dead"),
        }
    }
}

/// One workstation in the occupancy report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Logged-in user, if the seat is occupied
    pub login: Option<String>,
    pub hostname: Hostname,
    pub session_type: SessionType,
    /// Hardware liveness, independent of occupancy
    pub alive: bool,
}

/// The data sources an adapter can read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Seat/session directory (ordinary sessions)
    SeatSessions,
    /// Exam session directory
    ExamSessions,
    /// Host health registry
    HostHealth,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::SeatSessions => "seat_sessions",
            SourceKind::ExamSessions => "exam_sessions",
            SourceKind::HostHealth => "host_health",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence about a workstation contributed by one source.
///
/// Facts are not authoritative: several facts may name the same hostname and
/// disagree. The reconciliation engine resolves them into `LocationRecord`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFact {
    pub login: Option<String>,
    pub hostname: Hostname,
    pub session_type: SessionType,
    pub alive: bool,
}

impl SourceFact {
    /// An ordinary session on a live machine
    pub fn seat(login: impl Into<String>, hostname: Hostname) -> Self {
        Self {
            login: Some(login.into()),
            hostname,
            session_type: SessionType::Normal,
            alive: true,
        }
    }

    /// An exam session on a live machine
    pub fn exam(login: impl Into<String>, hostname: Hostname) -> Self {
        Self {
            login: Some(login.into()),
            hostname,
            session_type: SessionType::Exam,
            alive: true,
        }
    }

    /// A machine the health registry reports as dead
    pub fn dead(hostname: Hostname, alive: bool) -> Self {
        Self {
            login: None,
            hostname,
            session_type: SessionType::Dead,
            alive,
        }
    }

    pub fn into_record(self) -> LocationRecord {
        LocationRecord {
            login: self.login,
            hostname: self.hostname,
            session_type: self.session_type,
            alive: self.alive,
        }
    }
}

/// How the exam-session stage treats a hostname the seat stage already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamSessionConflict {
    /// Keep the seat record; the exam fact is ignored
    #[default]
    KeepFirst,
    /// Replace the seat record's login and mark it as an exam session
    Overwrite,
}

/// Health of a single source store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: SourceKind,
    pub ok: bool,
}

/// Service health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `ok` when every source is reachable, `degraded` otherwise
    pub status: String,
    pub version: String,
    pub checked_at: DateTime<Local>,
    pub sources: Vec<SourceHealth>,
    pub oracle_enabled: bool,
}

impl HealthStatus {
    pub fn all_sources_ok(&self) -> bool {
        self.sources.iter().all(|s| s.ok)
    }
}
