// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend trait definitions
//!
//! The orchestrator never implements exclusion itself: every guarantee
//! about a single key comes from the backend.

use crate::config::LockParams;
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// A named low-level lock
#[async_trait]
pub trait LockHandle: Send + Sync + 'static {
    fn key(&self) -> &str;

    /// Try to take the lock
    ///
    /// Non-blocking calls return immediately. Blocking calls wait up to
    /// `timeout`, or indefinitely when it is `None`.
    async fn acquire(&self, blocking: bool, timeout: Option<Duration>)
        -> Result<bool, BackendError>;

    /// Give the lock back; releasing an already-released handle is allowed
    fn release(&self) -> Result<(), BackendError>;
}

/// Factory for named locks sharing one keyspace
#[async_trait]
pub trait LockBackend: Clone + Send + Sync + 'static {
    type Handle: LockHandle;

    fn new_lock(&self, key: &str, params: LockParams) -> Self::Handle;

    /// Keys currently held by anyone; a hint that may be stale
    async fn held_keys(&self) -> Result<HashSet<String>, BackendError>;

    /// Forget every lock. Voids collision safety; tests and operators only.
    async fn clear_all(&self) -> Result<(), BackendError>;
}
