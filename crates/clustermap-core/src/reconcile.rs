//! Reconciliation of source facts into one occupancy report

use clustermap_api::{ExamSessionConflict, LocationRecord, SessionType, SourceFact};
use clustermap_util::Hostname;
use std::collections::HashMap;
use tracing::debug;

/// Knobs of the reconciliation engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    pub exam_session_conflict: ExamSessionConflict,
}

/// Everything one aggregation pass gathered, before reconciliation
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub seats: Vec<SourceFact>,
    pub exams: Vec<SourceFact>,
    pub dead_hosts: Vec<SourceFact>,
    pub exam_mode_hosts: Vec<Hostname>,
}

/// What each stage did during a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub seats_added: usize,
    pub seats_duplicate: usize,
    pub exams_added: usize,
    pub exams_overwritten: usize,
    pub exams_ignored: usize,
    pub dead_added: usize,
    pub dead_overlaid: usize,
    pub oracle_added: usize,
    pub oracle_overlaid: usize,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub records: Vec<LocationRecord>,
    pub stats: ReconcileStats,
}

/// Records under construction, indexed by hostname
#[derive(Default)]
struct Ledger {
    records: Vec<LocationRecord>,
    index: HashMap<Hostname, usize>,
}

impl Ledger {
    fn get_mut(&mut self, hostname: &Hostname) -> Option<&mut LocationRecord> {
        let slot = *self.index.get(hostname)?;
        self.records.get_mut(slot)
    }

    fn contains(&self, hostname: &Hostname) -> bool {
        self.index.contains_key(hostname)
    }

    fn push(&mut self, record: LocationRecord) {
        self.index.insert(record.hostname.clone(), self.records.len());
        self.records.push(record);
    }
}

/// Merges facts from every source, later stages taking precedence
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    policy: ReconcilePolicy,
}

impl Reconciler {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Reconcile one snapshot.
    ///
    /// Stages run in order seat, exam session, dead host, oracle. Each stage
    /// may overwrite what earlier stages recorded for the same hostname, so
    /// the result never holds two records for one hostname.
    pub fn reconcile(&self, snapshot: SourceSnapshot) -> Reconciled {
        let mut ledger = Ledger::default();
        let mut stats = ReconcileStats::default();

        for fact in snapshot.seats {
            if ledger.contains(&fact.hostname) {
                debug!(hostname = %fact.hostname, "Ignoring duplicate seat session");
                stats.seats_duplicate += 1;
                continue;
            }
            ledger.push(fact.into_record());
            stats.seats_added += 1;
        }

        for fact in snapshot.exams {
            self.apply_exam(&mut ledger, &mut stats, fact);
        }

        for fact in snapshot.dead_hosts {
            match ledger.get_mut(&fact.hostname) {
                Some(record) => {
                    record.alive = fact.alive;
                    record.session_type = SessionType::Dead;
                    stats.dead_overlaid += 1;
                }
                None => {
                    ledger.push(LocationRecord {
                        login: None,
                        ..fact.into_record()
                    });
                    stats.dead_added += 1;
                }
            }
        }

        for hostname in snapshot.exam_mode_hosts {
            match ledger.get_mut(&hostname) {
                Some(record) => {
                    record.session_type = SessionType::Exam;
                    stats.oracle_overlaid += 1;
                }
                None => {
                    ledger.push(LocationRecord {
                        login: None,
                        hostname,
                        session_type: SessionType::Exam,
                        alive: true,
                    });
                    stats.oracle_added += 1;
                }
            }
        }

        Reconciled {
            records: ledger.records,
            stats,
        }
    }

    fn apply_exam(&self, ledger: &mut Ledger, stats: &mut ReconcileStats, fact: SourceFact) {
        let Some(record) = ledger.get_mut(&fact.hostname) else {
            ledger.push(fact.into_record());
            stats.exams_added += 1;
            return;
        };

        match self.policy.exam_session_conflict {
            ExamSessionConflict::KeepFirst => {
                debug!(
                    hostname = %fact.hostname,
                    kept = ?record.login,
                    ignored = ?fact.login,
                    "Exam session collides with a seat session, keeping the first"
                );
                stats.exams_ignored += 1;
            }
            ExamSessionConflict::Overwrite => {
                record.login = fact.login;
                record.session_type = SessionType::Exam;
                stats.exams_overwritten += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> Hostname {
        Hostname::normalize(name, None).unwrap()
    }

    fn find<'a>(records: &'a [LocationRecord], name: &str) -> &'a LocationRecord {
        records
            .iter()
            .find(|r| r.hostname.as_str() == name)
            .unwrap_or_else(|| panic!("no record for {name}"))
    }

    #[test]
    fn test_dead_overlay_keeps_login() {
        let snapshot = SourceSnapshot {
            seats: vec![SourceFact::seat("abc", host("h1"))],
            dead_hosts: vec![SourceFact::dead(host("h1"), false)],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        assert_eq!(
            out.records,
            vec![LocationRecord {
                login: Some("abc".into()),
                hostname: host("h1"),
                session_type: SessionType::Dead,
                alive: false,
            }]
        );
        assert_eq!(out.stats.dead_overlaid, 1);
    }

    #[test]
    fn test_oracle_only_host_is_appended() {
        let snapshot = SourceSnapshot {
            exam_mode_hosts: vec![host("h2")],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        assert_eq!(
            out.records,
            vec![LocationRecord {
                login: None,
                hostname: host("h2"),
                session_type: SessionType::Exam,
                alive: true,
            }]
        );
        assert_eq!(out.stats.oracle_added, 1);
    }

    #[test]
    fn test_oracle_beats_dead_host() {
        let snapshot = SourceSnapshot {
            seats: vec![SourceFact::seat("abc", host("h1"))],
            dead_hosts: vec![SourceFact::dead(host("h1"), false)],
            exam_mode_hosts: vec![host("h1")],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        let record = find(&out.records, "h1");
        assert_eq!(record.session_type, SessionType::Exam);
        assert!(!record.alive);
        assert_eq!(record.login.as_deref(), Some("abc"));
    }

    #[test]
    fn test_dead_host_without_session_has_no_login() {
        let snapshot = SourceSnapshot {
            dead_hosts: vec![SourceFact::dead(host("h3"), false)],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        let record = find(&out.records, "h3");
        assert!(record.login.is_none());
        assert_eq!(record.session_type, SessionType::Dead);
    }

    #[test]
    fn test_duplicate_seat_keeps_first() {
        let snapshot = SourceSnapshot {
            seats: vec![
                SourceFact::seat("first", host("h1")),
                SourceFact::seat("second", host("h1")),
            ],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].login.as_deref(), Some("first"));
        assert_eq!(out.stats.seats_duplicate, 1);
    }

    #[test]
    fn test_exam_collision_keep_first() {
        let snapshot = SourceSnapshot {
            seats: vec![SourceFact::seat("abc", host("h1"))],
            exams: vec![
                SourceFact::exam("xyz", host("h1")),
                SourceFact::exam("def", host("h2")),
            ],
            ..Default::default()
        };

        let out = Reconciler::default().reconcile(snapshot);
        let h1 = find(&out.records, "h1");
        assert_eq!(h1.login.as_deref(), Some("abc"));
        assert_eq!(h1.session_type, SessionType::Normal);
        assert_eq!(find(&out.records, "h2").session_type, SessionType::Exam);
        assert_eq!(out.stats.exams_ignored, 1);
        assert_eq!(out.stats.exams_added, 1);
    }

    #[test]
    fn test_exam_collision_overwrite() {
        let reconciler = Reconciler::new(ReconcilePolicy {
            exam_session_conflict: ExamSessionConflict::Overwrite,
        });
        let snapshot = SourceSnapshot {
            seats: vec![SourceFact::seat("abc", host("h1"))],
            exams: vec![SourceFact::exam("xyz", host("h1"))],
            ..Default::default()
        };

        let out = reconciler.reconcile(snapshot);
        assert_eq!(out.records.len(), 1);
        let h1 = find(&out.records, "h1");
        assert_eq!(h1.login.as_deref(), Some("xyz"));
        assert_eq!(h1.session_type, SessionType::Exam);
        assert_eq!(out.stats.exams_overwritten, 1);
    }

    #[test]
    fn test_hostnames_are_unique() {
        let snapshot = SourceSnapshot {
            seats: vec![
                SourceFact::seat("a", host("h1")),
                SourceFact::seat("b", host("h2")),
                SourceFact::seat("c", host("h1")),
            ],
            exams: vec![SourceFact::exam("d", host("h2")), SourceFact::exam("e", host("h3"))],
            dead_hosts: vec![SourceFact::dead(host("h3"), false), SourceFact::dead(host("h4"), false)],
            exam_mode_hosts: vec![host("h4"), host("h5"), host("h5")],
        };

        let out = Reconciler::default().reconcile(snapshot);
        let mut names: Vec<&str> = out.records.iter().map(|r| r.hostname.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["h1", "h2", "h3", "h4", "h5"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let snapshot = SourceSnapshot {
            seats: vec![SourceFact::seat("a", host("h1"))],
            exams: vec![SourceFact::exam("b", host("h2"))],
            dead_hosts: vec![SourceFact::dead(host("h1"), false)],
            exam_mode_hosts: vec![host("h3")],
        };

        let reconciler = Reconciler::default();
        let first = reconciler.reconcile(snapshot.clone());
        let second = reconciler.reconcile(snapshot);
        assert_eq!(first.records, second.records);
        assert_eq!(first.stats, second.stats);
    }
}
