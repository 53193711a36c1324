// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holder identity for backend leases

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies who holds a backend lease
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints holder ids
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> HolderId;
}

/// UUID-based generator for production use
#[derive(Clone, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> HolderId {
        HolderId(uuid::Uuid::new_v4().to_string())
    }
}

/// Sequential generator for predictable test output
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("holder")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> HolderId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        HolderId(format!("{}-{}", self.prefix, n))
    }
}
