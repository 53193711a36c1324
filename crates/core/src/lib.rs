// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! quorum-core: quorum resource locking over a pluggable backend
//!
//! This crate provides:
//! - Potentials and quorum requirements over arbitrary resource items
//! - The [`Lock`] orchestrator with rollback, prioritisation and retries
//! - Backend and reporter contracts, plus an in-memory usage reporter

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod lock;
pub mod potential;
pub mod reporter;
pub mod requirement;
pub mod retry;
pub mod tags;

pub use backend::{LockBackend, LockHandle};
pub use clock::{Clock, FakeClock, Stopwatch, SystemClock};
pub use config::{LockOptions, LockParams, RetryConfig};
pub use error::{BackendError, LockError};
pub use id::{HolderId, IdGen, SequentialIdGen, UuidIdGen};
pub use lock::{Lock, LockGuard, LOCK_OF_LOCKS_KEY};
pub use potential::{Potential, PotentialStatus};
pub use reporter::{Aspect, MemoryReporter, NoopReporter, Reporter, TracingReporter};
pub use requirement::{Candidate, Requirement, RequirementState};
pub use retry::{RetryAction, RetryPolicy, RetryState};
pub use tags::{tags, TagValue, Tags, KEY_TAG};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use backend::{FakeBackend, FakeCall, FakeHandle};
