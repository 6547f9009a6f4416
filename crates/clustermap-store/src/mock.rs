//! Static source adapter for testing

use clustermap_api::{SourceFact, SourceKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{SourceAdapter, StoreError, StoreResult};

/// Source adapter serving a fixed set of facts
pub struct StaticSource {
    kind: SourceKind,
    facts: Mutex<Vec<SourceFact>>,
    failing: Mutex<bool>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(kind: SourceKind, facts: Vec<SourceFact>) -> Self {
        Self {
            kind,
            facts: Mutex::new(facts),
            failing: Mutex::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn empty(kind: SourceKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Replace the facts returned by subsequent fetches
    pub fn set_facts(&self, facts: Vec<SourceFact>) {
        *self.facts.lock().unwrap_or_else(|e| e.into_inner()) = facts;
    }

    /// Make subsequent fetches fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }

    /// Number of fetches served so far, failed ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SourceAdapter for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self) -> StoreResult<Vec<SourceFact>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if *self.failing.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::Unavailable(format!("{} store offline", self.kind)));
        }

        Ok(self.facts.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn is_healthy(&self) -> bool {
        !*self.failing.lock().unwrap_or_else(|e| e.into_inner())
    }
}
