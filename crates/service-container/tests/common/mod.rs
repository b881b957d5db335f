//! Common test utilities for service container integration tests

#![allow(dead_code)]

use anyhow::anyhow;
use async_channel::Receiver;
use async_trait::async_trait;
use service_container::{LifecycleContext, LifecycleEvent, Service, ServiceName};
use service_txn::{Severity, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

/// Route container logs to the test writer once per test binary
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Shared record of user start and stop calls, in order
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Service that records every start and stop in a journal
///
/// Starting fails while `fail_start` is set; stopping fails while
/// `fail_stop` is set.
#[derive(Clone)]
pub struct RecordingService {
    journal: Journal,
    fail_start: Arc<AtomicBool>,
    fail_stop: Arc<AtomicBool>,
}

impl RecordingService {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing(journal: &Journal) -> Self {
        let service = Self::new(journal);
        service.set_fail_start(true);
        service
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Service for RecordingService {
    async fn start(&self, ctx: &LifecycleContext) -> anyhow::Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            self.journal.push(format!("start-failed {}", ctx.name()));
            return Err(anyhow!("{} refused to start", ctx.name()));
        }
        self.journal.push(format!("start {}", ctx.name()));
        Ok(())
    }

    async fn stop(&self, ctx: &LifecycleContext) -> anyhow::Result<()> {
        self.journal.push(format!("stop {}", ctx.name()));
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(anyhow!("{} refused to stop", ctx.name()));
        }
        Ok(())
    }
}

/// Prepare and commit, panicking with the reported problems on failure
pub async fn run_and_commit(txn: &Transaction) {
    txn.prepare().await.expect("Failed to prepare transaction");
    if let Err(e) = txn.commit() {
        panic!("Failed to commit: {e} (problems: {:?})", txn.problems());
    }
}

/// Everything received so far, without waiting
pub fn drain(events: &Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Problems of at least the given severity
pub fn problems_at_least(txn: &Transaction, severity: Severity) -> usize {
    txn.problems()
        .iter()
        .filter(|problem| problem.severity >= severity)
        .count()
}

pub fn name(name: &str) -> ServiceName {
    ServiceName::parse(name)
}
