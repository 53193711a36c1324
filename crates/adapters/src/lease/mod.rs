// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease backend: expiring locks with optional auto-renewal
//!
//! Leases last `expire` from their last grant or renewal. With
//! `auto_renewal` a heartbeat task renews the lease every `expire / 3`
//! until the handle is released or dropped. Holders that stop renewing
//! lose their lease to the next acquirer once it expires.

mod state;

pub use state::{Lease, LeaseInput, LeaseOutcome, LeaseState};

use async_trait::async_trait;
use quorum_core::{
    BackendError, Clock, HolderId, IdGen, LockBackend, LockHandle, LockParams, SystemClock,
    UuidIdGen,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default interval between attempts of a blocking acquire
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct Shared<C> {
    leases: Mutex<HashMap<String, Lease>>,
    clock: C,
}

impl<C: Clock> Shared<C> {
    fn apply(&self, key: &str, input: LeaseInput) -> LeaseOutcome {
        let mut leases = self.leases.lock().unwrap_or_else(|e| e.into_inner());
        let lease = leases.entry(key.to_string()).or_default();
        let (next, outcome) = lease.transition(input, &self.clock);
        if next.state == LeaseState::Free {
            leases.remove(key);
        } else {
            *lease = next;
        }
        outcome
    }
}

/// In-process backend with expiring, renewable leases
pub struct LeaseBackend<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    shared: Arc<Shared<C>>,
    ids: G,
    poll_interval: Duration,
}

impl<C: Clock, G: IdGen> Clone for LeaseBackend<C, G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            ids: self.ids.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl Default for LeaseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaseBackend {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, UuidIdGen)
    }
}

impl<C: Clock, G: IdGen> LeaseBackend<C, G> {
    pub fn with_parts(clock: C, ids: G) -> Self {
        Self {
            shared: Arc::new(Shared {
                leases: Mutex::new(HashMap::new()),
                clock,
            }),
            ids,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current holder of a live lease on `key`
    pub fn holder(&self, key: &str) -> Option<HolderId> {
        let leases = self.shared.leases.lock().unwrap_or_else(|e| e.into_inner());
        leases
            .get(key)
            .filter(|lease| lease.is_live(&self.shared.clock))
            .and_then(|lease| lease.holder().cloned())
    }
}

/// Handle issued by [`LeaseBackend`]
pub struct LeaseHandle<C: Clock = SystemClock> {
    key: String,
    holder: HolderId,
    params: LockParams,
    poll_interval: Duration,
    shared: Arc<Shared<C>>,
    /// Set while this handle believes it holds the lease
    holding: Mutex<bool>,
    renewal: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> LeaseHandle<C> {
    pub fn holder(&self) -> &HolderId {
        &self.holder
    }

    fn try_acquire(&self) -> bool {
        let outcome = self.shared.apply(
            &self.key,
            LeaseInput::Acquire {
                holder: self.holder.clone(),
                ttl: self.params.expire,
            },
        );
        match &outcome {
            LeaseOutcome::Reclaimed { previous } => {
                tracing::warn!(key = %self.key, previous = %previous, "reclaimed expired lease");
            }
            LeaseOutcome::Denied { current } => {
                tracing::trace!(key = %self.key, current = %current, "lease denied");
            }
            _ => {}
        }
        outcome.is_granted()
    }

    fn start_renewal(&self) {
        let interval = self.params.expire / 3;
        if interval.is_zero() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let key = self.key.clone();
        let holder = self.holder.clone();
        let ttl = self.params.expire;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let input = LeaseInput::Renew {
                    holder: holder.clone(),
                    ttl,
                };
                if shared.apply(&key, input) != LeaseOutcome::Renewed {
                    tracing::warn!(key = %key, holder = %holder, "lease lost, stopping renewal");
                    break;
                }
                tracing::trace!(key = %key, "lease renewed");
            }
        });
        self.stop_renewal();
        *self.renewal.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
    }

    fn stop_renewal(&self) {
        if let Some(task) = self.renewal.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
    }

    fn set_holding(&self, holding: bool) -> bool {
        std::mem::replace(
            &mut *self.holding.lock().unwrap_or_else(|e| e.into_inner()),
            holding,
        )
    }
}

#[async_trait]
impl<C: Clock> LockHandle for LeaseHandle<C> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn acquire(
        &self,
        blocking: bool,
        timeout: Option<Duration>,
    ) -> Result<bool, BackendError> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        let mut acquired = self.try_acquire();

        while !acquired && blocking {
            let mut pause = self.poll_interval;
            if let Some(deadline) = deadline {
                let left = deadline.saturating_duration_since(tokio::time::Instant::now());
                if left.is_zero() {
                    break;
                }
                pause = pause.min(left);
            }
            tokio::time::sleep(pause).await;
            acquired = self.try_acquire();
        }

        if acquired {
            self.set_holding(true);
            if self.params.auto_renewal {
                self.start_renewal();
            }
        }
        Ok(acquired)
    }

    fn release(&self) -> Result<(), BackendError> {
        self.stop_renewal();
        if !self.set_holding(false) {
            return Ok(());
        }

        let input = LeaseInput::Release {
            holder: self.holder.clone(),
        };
        match self.shared.apply(&self.key, input) {
            LeaseOutcome::Released => Ok(()),
            _ => Err(BackendError::NotHeld(format!(
                "lease on {} was reclaimed from {}",
                self.key, self.holder
            ))),
        }
    }
}

impl<C: Clock> Drop for LeaseHandle<C> {
    fn drop(&mut self) {
        self.stop_renewal();
    }
}

#[async_trait]
impl<C: Clock, G: IdGen> LockBackend for LeaseBackend<C, G> {
    type Handle = LeaseHandle<C>;

    fn new_lock(&self, key: &str, params: LockParams) -> LeaseHandle<C> {
        LeaseHandle {
            key: key.to_string(),
            holder: self.ids.next(),
            params,
            poll_interval: self.poll_interval,
            shared: Arc::clone(&self.shared),
            holding: Mutex::new(false),
            renewal: Mutex::new(None),
        }
    }

    async fn held_keys(&self) -> Result<HashSet<String>, BackendError> {
        let leases = self.shared.leases.lock().unwrap_or_else(|e| e.into_inner());
        Ok(leases
            .iter()
            .filter(|(_, lease)| lease.is_live(&self.shared.clock))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn clear_all(&self) -> Result<(), BackendError> {
        self.shared
            .leases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
