// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual-exclusion backend contract

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod traits;

pub use traits::{LockBackend, LockHandle};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBackend, FakeCall, FakeHandle};
