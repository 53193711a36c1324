// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Concrete lock backends

pub mod lease;
pub mod memory;
pub mod traced;

pub use lease::{LeaseBackend, LeaseHandle};
pub use memory::{MemoryBackend, MemoryHandle};
pub use traced::{TracedBackend, TracedHandle};
