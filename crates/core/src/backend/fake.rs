// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake backend with call recording and scripted failures for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::traits::{LockBackend, LockHandle};
use crate::config::LockParams;
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded call to the fake backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    NewLock {
        key: String,
        params: LockParams,
    },
    Acquire {
        key: String,
        blocking: bool,
        timeout: Option<Duration>,
    },
    Release {
        key: String,
    },
    HeldKeys,
    ClearAll,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<FakeCall>,
    /// key -> id of the handle holding it
    held: HashMap<String, u64>,
    next_handle: u64,
    // Configurable failure modes
    denied: HashSet<String>,
    acquire_fails: HashSet<String>,
    release_fails: HashSet<String>,
    held_hint: Option<HashSet<String>>,
    held_keys_fails: bool,
}

/// In-memory backend that never blocks, for orchestrator tests
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<FakeCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    /// Keys passed to `acquire`, in call order
    pub fn acquired_keys(&self) -> Vec<String> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    FakeCall::Acquire { key, .. } => Some(key.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    /// Keys passed to `release`, in call order
    pub fn released_keys(&self) -> Vec<String> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    FakeCall::Release { key } => Some(key.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.with_state(|s| s.held.contains_key(key))
    }

    /// Mark a key as held by an outside party
    pub fn hold(&self, key: &str) {
        self.with_state(|s| {
            s.next_handle += 1;
            let id = s.next_handle;
            s.held.insert(key.to_string(), id);
        });
    }

    /// Make acquisitions of `key` return false
    pub fn deny(&self, key: &str) {
        self.with_state(|s| s.denied.insert(key.to_string()));
    }

    /// Make acquisitions of `key` return a backend error
    pub fn fail_acquire(&self, key: &str) {
        self.with_state(|s| s.acquire_fails.insert(key.to_string()));
    }

    /// Make releases of `key` return a backend error
    pub fn fail_release(&self, key: &str) {
        self.with_state(|s| s.release_fails.insert(key.to_string()));
    }

    /// Override the held-keys hint
    pub fn set_held_hint(&self, keys: &[&str]) {
        self.with_state(|s| s.held_hint = Some(keys.iter().map(|k| k.to_string()).collect()));
    }

    /// Make `held_keys` fail
    pub fn set_held_keys_fails(&self, fails: bool) {
        self.with_state(|s| s.held_keys_fails = fails);
    }
}

/// Handle issued by [`FakeBackend`]
pub struct FakeHandle {
    key: String,
    id: u64,
    state: Arc<Mutex<FakeState>>,
}

impl FakeHandle {
    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl LockHandle for FakeHandle {
    fn key(&self) -> &str {
        &self.key
    }

    async fn acquire(
        &self,
        blocking: bool,
        timeout: Option<Duration>,
    ) -> Result<bool, BackendError> {
        self.with_state(|s| {
            s.calls.push(FakeCall::Acquire {
                key: self.key.clone(),
                blocking,
                timeout,
            });

            if s.acquire_fails.contains(&self.key) {
                return Err(BackendError::Unavailable(format!(
                    "scripted failure for {}",
                    self.key
                )));
            }
            if s.denied.contains(&self.key) {
                return Ok(false);
            }
            match s.held.get(&self.key) {
                Some(&holder) => Ok(holder == self.id),
                None => {
                    s.held.insert(self.key.clone(), self.id);
                    Ok(true)
                }
            }
        })
    }

    fn release(&self) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.calls.push(FakeCall::Release {
                key: self.key.clone(),
            });

            if s.release_fails.contains(&self.key) {
                return Err(BackendError::Other(format!(
                    "scripted release failure for {}",
                    self.key
                )));
            }
            if s.held.get(&self.key) == Some(&self.id) {
                s.held.remove(&self.key);
            }
            Ok(())
        })
    }
}

#[async_trait]
impl LockBackend for FakeBackend {
    type Handle = FakeHandle;

    fn new_lock(&self, key: &str, params: LockParams) -> FakeHandle {
        let id = self.with_state(|s| {
            s.calls.push(FakeCall::NewLock {
                key: key.to_string(),
                params,
            });
            s.next_handle += 1;
            s.next_handle
        });
        FakeHandle {
            key: key.to_string(),
            id,
            state: Arc::clone(&self.state),
        }
    }

    async fn held_keys(&self) -> Result<HashSet<String>, BackendError> {
        self.with_state(|s| {
            s.calls.push(FakeCall::HeldKeys);
            if s.held_keys_fails {
                return Err(BackendError::Unavailable("held keys unavailable".to_string()));
            }
            Ok(s
                .held_hint
                .clone()
                .unwrap_or_else(|| s.held.keys().cloned().collect()))
        })
    }

    async fn clear_all(&self) -> Result<(), BackendError> {
        self.with_state(|s| {
            s.calls.push(FakeCall::ClearAll);
            s.held.clear();
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
