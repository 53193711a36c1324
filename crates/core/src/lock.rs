// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quorum lock orchestrator
//!
//! A [`Lock`] holds one or more [`Requirement`]s, all of which must be met.
//! Each attempt runs under the backend's lock of locks, walks requirements
//! in order, tries potentials one at a time in prioritised order, and rolls
//! every partial acquisition back if any requirement misses its quorum.
//! Whole attempts are retried under the configured [`RetryPolicy`].

use crate::backend::{LockBackend, LockHandle};
use crate::clock::{Clock, Stopwatch, SystemClock};
use crate::config::LockOptions;
use crate::error::LockError;
use crate::reporter::{NoopReporter, Reporter};
use crate::requirement::{Requirement, RequirementState};
use crate::retry::{RetryAction, RetryPolicy, RetryState};
use crate::tags::Tags;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reserved backend key that serialises acquisition attempts
pub const LOCK_OF_LOCKS_KEY: &str = "lock_of_locks";

/// A backend lock taken during acquisition
struct Obtained<H> {
    handle: H,
    tags: Tags,
}

/// Held lock of locks; released when dropped
struct MetaLock<H: LockHandle> {
    handle: H,
}

impl<H: LockHandle> Drop for MetaLock<H> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release() {
            warn!(error = %e, "lock of locks release failed");
        }
    }
}

/// AND-composition of quorum requirements over a shared backend
///
/// Not safe for concurrent `acquire()` on the same instance; use one
/// `Lock` per actor.
pub struct Lock<B: LockBackend, T = String, C: Clock = SystemClock> {
    backend: B,
    options: LockOptions,
    requirements: Vec<Requirement<T>>,
    obtained: Vec<Obtained<B::Handle>>,
    unique_keys: HashSet<String>,
    reporter: Arc<dyn Reporter>,
    clock: C,
    /// Started once a whole acquisition has succeeded
    held: Option<Stopwatch>,
}

impl<B: LockBackend, T> Lock<B, T, SystemClock> {
    pub fn new(backend: B, options: LockOptions) -> Result<Self, LockError> {
        options.validate()?;
        Ok(Self {
            backend,
            options,
            requirements: Vec::new(),
            obtained: Vec::new(),
            unique_keys: HashSet::new(),
            reporter: Arc::new(NoopReporter),
            clock: SystemClock,
            held: None,
        })
    }
}

impl<B: LockBackend, T: fmt::Display + 'static> Lock<B, T, SystemClock> {
    /// Lock needing each item as its own singleton requirement
    pub fn from_items(
        backend: B,
        items: impl IntoIterator<Item = T>,
        options: LockOptions,
    ) -> Result<Self, LockError> {
        let mut lock = Self::new(backend, options)?;
        for item in items {
            lock.add_item(item)?;
        }
        Ok(lock)
    }
}

impl<B: LockBackend, T: fmt::Display + 'static, C: Clock> Lock<B, T, C> {
    /// Wrap a raw item as a singleton requirement using the default `need`
    pub fn add_item(&mut self, item: T) -> Result<&mut Self, LockError> {
        let requirement = Requirement::new()
            .with_need(self.options.need)
            .items([item]);
        self.add_requirement(requirement)
    }
}

impl<B: LockBackend, T, C: Clock> Lock<B, T, C> {
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> Lock<B, T, C2> {
        Lock {
            backend: self.backend,
            options: self.options,
            requirements: self.requirements,
            obtained: self.obtained,
            unique_keys: self.unique_keys,
            reporter: self.reporter,
            clock,
            held: self.held,
        }
    }

    /// Builder form of [`Lock::add_requirement`]
    pub fn requirement(mut self, requirement: Requirement<T>) -> Result<Self, LockError> {
        self.add_requirement(requirement)?;
        Ok(self)
    }

    /// Register a requirement
    ///
    /// Fails if it can never reach its quorum or if any of its keys is
    /// already used by this lock; nothing is registered on failure.
    pub fn add_requirement(&mut self, mut requirement: Requirement<T>) -> Result<&mut Self, LockError> {
        requirement.reset();
        requirement.validate().map_err(|e| match e {
            LockError::RequirementNotMet { remaining, need } => {
                LockError::InvalidRequirement { remaining, need }
            }
            other => other,
        })?;

        let mut keys = HashSet::new();
        for key in requirement.keys() {
            if self.unique_keys.contains(key) || !keys.insert(key.to_string()) {
                return Err(LockError::DuplicateKey(key.to_string()));
            }
        }

        self.unique_keys.extend(keys);
        self.requirements.push(requirement);
        Ok(self)
    }

    pub fn requirements(&self) -> &[Requirement<T>] {
        &self.requirements
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn unique_keys(&self) -> &HashSet<String> {
        &self.unique_keys
    }

    /// Whether a successful acquisition is currently held
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Keys of held backend locks, in acquisition order
    pub fn obtained_keys(&self) -> Vec<&str> {
        self.obtained.iter().map(|o| o.handle.key()).collect()
    }

    /// Acquire every requirement, retrying quorum failures with backoff
    pub async fn acquire(&mut self) -> Result<&[Requirement<T>], LockError> {
        if self.is_held() || !self.obtained.is_empty() {
            warn!("acquire called while holding locks, releasing them first");
            self.release();
        }

        let policy = RetryPolicy::from_options(&self.options);
        let wait = Stopwatch::start(&self.clock);
        let mut retry = RetryState::new(wait.started_at());

        loop {
            let err = match self.attempt(&wait).await {
                Ok(()) => return Ok(&self.requirements),
                Err(err) => err,
            };

            let action = policy.next_action(&retry, &err, self.clock.now(), &mut rand::thread_rng());
            match action {
                RetryAction::GiveUp => {
                    warn!(error = %err, retries = retry.retries, "giving up on lock acquisition");
                    return Err(err);
                }
                RetryAction::Retry { after } => {
                    retry.record_retry();
                    debug!(
                        error = %err,
                        retry = retry.retries,
                        delay_ms = after.as_millis() as u64,
                        "retrying lock acquisition"
                    );
                    tokio::time::sleep(after).await;
                }
            }
        }
    }

    /// Acquire and return a guard that releases on drop
    pub async fn guard(&mut self) -> Result<LockGuard<'_, B, T, C>, LockError> {
        self.acquire().await?;
        Ok(LockGuard { lock: self })
    }

    /// Release everything held and reset all requirements
    ///
    /// Never fails: individual release errors are logged and skipped.
    pub fn release(&mut self) {
        if !self.obtained.is_empty() {
            info!(count = self.obtained.len(), "releasing locks");
        }
        self.release_all();
    }

    /// Forget every lock in the backend. Voids collision safety.
    pub async fn clear_all(&self) -> Result<(), LockError> {
        error!("caution: clearing all locks; collision safety is voided");
        self.backend.clear_all().await?;
        Ok(())
    }

    /// One attempt under the lock of locks
    async fn attempt(&mut self, wait: &Stopwatch) -> Result<(), LockError> {
        let trivially_met = self
            .requirements
            .iter_mut()
            .all(|r| matches!(r.validate(), Ok(RequirementState::Fulfilled)));
        if trivially_met {
            self.held = Some(Stopwatch::start(&self.clock));
            return Ok(());
        }

        let handle = self
            .backend
            .new_lock(LOCK_OF_LOCKS_KEY, self.options.meta_lock_params());
        if !handle.acquire(true, None).await? {
            return Err(LockError::MetaLockUnavailable);
        }
        // Released on drop, also when the caller abandons `acquire()`
        let meta = MetaLock { handle };

        let result = self.acquire_all().await;
        if result.is_err() {
            warn!("lock acquisition failed, releasing all partial locks");
            self.release_all();
        }
        drop(meta);

        result?;

        let waited = wait.elapsed(&self.clock);
        for obtained in &self.obtained {
            self.reporter.lock_success(waited, &obtained.tags);
        }
        self.held = Some(Stopwatch::start(&self.clock));
        Ok(())
    }

    async fn acquire_all(&mut self) -> Result<(), LockError> {
        let params = self.options.lock_params();
        let (blocking, timeout) = self.options.acquire_mode();

        for index in 0..self.requirements.len() {
            if self.requirements[index].validate()? == RequirementState::Fulfilled {
                continue;
            }
            let known_locked = match self.backend.held_keys().await {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(error = %e, "could not list held keys, trying in random order");
                    HashSet::new()
                }
            };
            let order = self.requirements[index].prioritised_order(&known_locked);

            for position in order {
                let requirement = &mut self.requirements[index];
                if requirement.validate()? != RequirementState::Pending {
                    break;
                }
                let Some(potential) = requirement.potentials().get(position) else {
                    continue;
                };
                if potential.is_resolved() {
                    continue;
                }
                let key = potential.key().to_string();
                let tags = potential.tags().clone();

                self.reporter.lock_requested(&tags);
                let handle = self.backend.new_lock(&key, params);
                info!(key = %key, timeout = ?timeout, "getting lock");
                let acquired = handle.acquire(blocking, timeout).await?;

                if let Some(potential) = self.requirements[index].potential_mut(position) {
                    if acquired {
                        potential.fulfill();
                    } else {
                        potential.reject();
                    }
                }
                if acquired {
                    self.obtained.push(Obtained { handle, tags });
                } else {
                    self.reporter.lock_failed(&tags);
                    warn!(key = %key, "didn't get lock");
                }
            }

            let requirement = &mut self.requirements[index];
            if requirement.validate()? != RequirementState::Fulfilled {
                return Err(LockError::RequirementNotMet {
                    remaining: requirement.remaining(),
                    need: requirement.need(),
                });
            }
        }
        Ok(())
    }

    fn release_all(&mut self) {
        let held_for = self.held.take().map(|mut watch| watch.stop(&self.clock));

        for obtained in self.obtained.drain(..) {
            match obtained.handle.release() {
                Ok(()) => {
                    if let Some(held) = held_for {
                        self.reporter.lock_released(held, &obtained.tags);
                    }
                }
                Err(e) => {
                    error!(key = obtained.handle.key(), error = %e, "partial lock release failed");
                }
            }
        }

        for requirement in &mut self.requirements {
            requirement.reset();
        }
    }
}

impl<B: LockBackend, T: fmt::Debug, C: Clock> fmt::Debug for Lock<B, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock")
            .field("requirements", &self.requirements)
            .field("obtained", &self.obtained_keys())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Scoped acquisition: derefs to the fulfilled requirements and releases
/// the lock when dropped, including on early return and panic unwinding
pub struct LockGuard<'a, B: LockBackend, T = String, C: Clock = SystemClock> {
    lock: &'a mut Lock<B, T, C>,
}

impl<B: LockBackend, T, C: Clock> LockGuard<'_, B, T, C> {
    /// Release now instead of at end of scope; `Drop` does the work
    pub fn release(self) {
        drop(self);
    }
}

impl<B: LockBackend, T, C: Clock> Deref for LockGuard<'_, B, T, C> {
    type Target = [Requirement<T>];

    fn deref(&self) -> &Self::Target {
        self.lock.requirements()
    }
}

impl<B: LockBackend, T, C: Clock> Drop for LockGuard<'_, B, T, C> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
