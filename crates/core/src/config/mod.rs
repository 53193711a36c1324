// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration modules

mod options;

pub use options::{LockOptions, LockParams, RetryConfig};
