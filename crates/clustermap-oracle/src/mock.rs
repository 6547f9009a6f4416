//! Oracles that never touch the network

use async_trait::async_trait;
use clustermap_util::Hostname;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::ExamModeOracle;

/// Oracle used when no oracle URL is configured
#[derive(Debug, Default)]
pub struct DisabledOracle;

#[async_trait]
impl ExamModeOracle for DisabledOracle {
    async fn fetch_exam_mode_hostnames(&self) -> Vec<Hostname> {
        Vec::new()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Oracle serving a fixed host list (for testing)
#[derive(Debug, Default)]
pub struct StaticOracle {
    hosts: Mutex<Vec<Hostname>>,
    fetches: AtomicUsize,
}

impl StaticOracle {
    pub fn new(hosts: Vec<Hostname>) -> Self {
        Self {
            hosts: Mutex::new(hosts),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_hosts(&self, hosts: Vec<Hostname>) {
        *self.hosts.lock().unwrap_or_else(|e| e.into_inner()) = hosts;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExamModeOracle for StaticOracle {
    async fn fetch_exam_mode_hostnames(&self) -> Vec<Hostname> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.hosts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
