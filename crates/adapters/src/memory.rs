// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process backend built on tokio semaphores
//!
//! Every key maps to one [`Semaphore`]; a handle holds at most one permit.
//! Leases never expire here, so `expire` and `auto_renewal` are ignored.
//! The lock of locks always has a single permit, whatever the capacity.
//! A key's slot is dropped once its last handle goes away.

use async_trait::async_trait;
use quorum_core::{BackendError, LockBackend, LockHandle, LockParams, LOCK_OF_LOCKS_KEY};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

struct Slot {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Slot {
    fn in_use(&self) -> bool {
        self.semaphore.available_permits() < self.capacity
    }
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

/// Backend whose keys live in this process only
#[derive(Clone)]
pub struct MemoryBackend {
    slots: Slots,
    capacity: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Exclusive locks: one holder per key
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Allow up to `capacity` concurrent holders per key
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits for `key`: the lock of locks always serialises
    fn capacity_for(&self, key: &str) -> usize {
        if key == LOCK_OF_LOCKS_KEY {
            1
        } else {
            self.capacity
        }
    }

    fn semaphore(&self, key: &str) -> Arc<Semaphore> {
        let capacity = self.capacity_for(key);
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        });
        Arc::clone(&slot.semaphore)
    }
}

/// Handle issued by [`MemoryBackend`]
pub struct MemoryHandle {
    key: String,
    slots: Slots,
    semaphore: Arc<Semaphore>,
    permit: Mutex<Option<OwnedSemaphorePermit>>,
}

impl MemoryHandle {
    fn is_holding(&self) -> bool {
        self.permit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn keep(&self, permit: OwnedSemaphorePermit) {
        *self.permit.lock().unwrap_or_else(|e| e.into_inner()) = Some(permit);
    }

    fn closed(&self) -> BackendError {
        BackendError::Unavailable(format!("semaphore for {} is closed", self.key))
    }
}

#[async_trait]
impl LockHandle for MemoryHandle {
    fn key(&self) -> &str {
        &self.key
    }

    async fn acquire(
        &self,
        blocking: bool,
        timeout: Option<Duration>,
    ) -> Result<bool, BackendError> {
        if self.is_holding() {
            return Ok(true);
        }

        let semaphore = Arc::clone(&self.semaphore);
        let permit = if !blocking {
            match semaphore.try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => return Ok(false),
                Err(TryAcquireError::Closed) => return Err(self.closed()),
            }
        } else if let Some(timeout) = timeout {
            match tokio::time::timeout(timeout, semaphore.acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(self.closed()),
                Err(_) => return Ok(false),
            }
        } else {
            semaphore
                .acquire_owned()
                .await
                .map_err(|_| self.closed())?
        };

        self.keep(permit);
        Ok(true)
    }

    fn release(&self) -> Result<(), BackendError> {
        // Dropping the permit hands it back to the semaphore
        drop(
            self.permit
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take(),
        );
        Ok(())
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        drop(
            self.permit
                .get_mut()
                .unwrap_or_else(|e| e.into_inner())
                .take(),
        );
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this handle still reference the semaphore
        let unused = slots.get(&self.key).is_some_and(|slot| {
            Arc::ptr_eq(&slot.semaphore, &self.semaphore)
                && Arc::strong_count(&self.semaphore) == 2
                && !slot.in_use()
        });
        if unused {
            slots.remove(&self.key);
        }
    }
}

#[async_trait]
impl LockBackend for MemoryBackend {
    type Handle = MemoryHandle;

    fn new_lock(&self, key: &str, _params: LockParams) -> MemoryHandle {
        MemoryHandle {
            key: key.to_string(),
            slots: Arc::clone(&self.slots),
            semaphore: self.semaphore(key),
            permit: Mutex::new(None),
        }
    }

    async fn held_keys(&self) -> Result<HashSet<String>, BackendError> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots
            .iter()
            .filter(|(_, slot)| slot.in_use())
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn clear_all(&self) -> Result<(), BackendError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        for slot in slots.values() {
            slot.semaphore.close();
        }
        slots.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
