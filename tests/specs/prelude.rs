//! Shared helpers for lock specs

#![allow(dead_code)]

pub use quorum_adapters::{LeaseBackend, MemoryBackend, TracedBackend};
pub use quorum_core::{
    Aspect, LockBackend, Lock, LockError, LockOptions, MemoryReporter, Requirement,
    RequirementState,
};
pub use std::collections::{HashMap, HashSet};
pub use std::sync::atomic::{AtomicUsize, Ordering};
pub use std::sync::{Arc, Mutex};
pub use std::time::Duration;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Each potential tried once without waiting; the whole attempt is not retried
pub fn try_once() -> LockOptions {
    LockOptions::new()
        .with_timeout(Duration::ZERO)
        .non_blocking()
}

/// Potentials tried without waiting; whole attempts retried quickly
pub fn keep_trying() -> LockOptions {
    LockOptions::new()
        .with_timeout(Duration::ZERO)
        .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
        .with_jitter(Duration::ZERO, Duration::from_millis(3))
        .with_max_cumulative_delay(Duration::from_secs(30))
}

pub fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}-{i}")).collect()
}

/// Occupancy per resource, failing if any exceeds its capacity
#[derive(Clone)]
pub struct Occupancy {
    capacity: usize,
    in_use: Arc<Mutex<HashMap<String, usize>>>,
    uses: Arc<Mutex<HashMap<String, usize>>>,
}

impl Occupancy {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: Arc::default(),
            uses: Arc::default(),
        }
    }

    pub fn enter(&self, key: &str) {
        let mut in_use = self.in_use.lock().unwrap();
        let count = in_use.entry(key.to_string()).or_default();
        *count += 1;
        assert!(
            *count <= self.capacity,
            "{key} held by {count} actors, capacity {}",
            self.capacity
        );
        *self.uses.lock().unwrap().entry(key.to_string()).or_default() += 1;
    }

    pub fn leave(&self, key: &str) {
        let mut in_use = self.in_use.lock().unwrap();
        if let Some(count) = in_use.get_mut(key) {
            *count -= 1;
        }
    }

    pub fn uses(&self) -> HashMap<String, usize> {
        self.uses.lock().unwrap().clone()
    }

    pub fn total_uses(&self) -> usize {
        self.uses.lock().unwrap().values().sum()
    }
}

/// Run one actor: acquire, occupy the fulfilled resources briefly, release
pub async fn actor<B: LockBackend>(
    backend: B,
    resources: Vec<String>,
    need: usize,
    rounds: usize,
    options: LockOptions,
    occupancy: Occupancy,
    reporter: MemoryReporter,
) {
    let mut lock = Lock::new(backend, options)
        .unwrap()
        .with_reporter(reporter);
    lock.add_requirement(Requirement::of(resources).with_need(need))
        .unwrap();

    for _ in 0..rounds {
        let requirements = lock.acquire().await.unwrap();
        let held: Vec<String> = requirements[0].fulfilled_items().cloned().collect();
        assert_eq!(held.len(), need);

        for key in &held {
            occupancy.enter(key);
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        for key in &held {
            occupancy.leave(key);
        }

        lock.release();
    }
}

/// Per-key successful acquisitions as seen by the reporter
pub fn reported_uses(reporter: &MemoryReporter, keys: &[String]) -> HashMap<String, usize> {
    keys.iter()
        .map(|key| {
            let count = reporter.aspect("key", key, Aspect::LockAcquireCount);
            (key.clone(), count as usize)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}
