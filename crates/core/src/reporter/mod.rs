// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Usage reporting for lock requests, acquisitions and releases
//!
//! Reporters are fire-and-forget: methods return nothing and must never
//! affect locking behaviour.

mod memory;

pub use memory::MemoryReporter;

use crate::tags::Tags;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Sink for lock usage metrics
pub trait Reporter: Send + Sync {
    /// A backend lock is about to be requested
    fn lock_requested(&self, _tags: &Tags) {}

    /// A lock is held as part of a successful acquisition
    fn lock_success(&self, _wait: Duration, _tags: &Tags) {}

    /// The backend refused a lock
    fn lock_failed(&self, _tags: &Tags) {}

    /// A successfully acquired lock was released after being held for `held`
    fn lock_released(&self, _held: Duration, _tags: &Tags) {}
}

/// Reporter that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Reporter that turns every call into a `tracing` event
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn lock_requested(&self, tags: &Tags) {
        tracing::debug!(tags = ?tags, "lock requested");
    }

    fn lock_success(&self, wait: Duration, tags: &Tags) {
        tracing::debug!(wait_ms = wait.as_millis() as u64, tags = ?tags, "lock acquired");
    }

    fn lock_failed(&self, tags: &Tags) {
        tracing::debug!(tags = ?tags, "lock refused");
    }

    fn lock_released(&self, held: Duration, tags: &Tags) {
        tracing::debug!(held_ms = held.as_millis() as u64, tags = ?tags, "lock released");
    }
}

/// Counters accumulated per tag value
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aspect {
    LockRequestCount,
    LockAcquireCount,
    LockReleaseCount,
    LockReleaseWait,
    LockAcquireWait,
    LockAcquireFailCount,
}

impl Aspect {
    pub const ALL: [Aspect; 6] = [
        Aspect::LockRequestCount,
        Aspect::LockAcquireCount,
        Aspect::LockReleaseCount,
        Aspect::LockReleaseWait,
        Aspect::LockAcquireWait,
        Aspect::LockAcquireFailCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::LockRequestCount => "lock_request_count",
            Aspect::LockAcquireCount => "lock_acquire_count",
            Aspect::LockReleaseCount => "lock_release_count",
            Aspect::LockReleaseWait => "lock_release_wait",
            Aspect::LockAcquireWait => "lock_acquire_wait",
            Aspect::LockAcquireFailCount => "lock_acquire_fail_count",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aspect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aspect::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("aspect {:?} not supported", s))
    }
}
