// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for lock construction, acquisition and backends

use thiserror::Error;

/// Errors raised by a mutual-exclusion backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("lock not held: {0}")]
    NotHeld(String),
    #[error("backend error: {0}")]
    Other(String),
}

/// Errors raised while building or acquiring a [`crate::Lock`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Two potentials in the same lock derive the same key
    #[error("must have unique keys, got two {0:?}")]
    DuplicateKey(String),

    /// A requirement can never reach its quorum
    #[error("requirement can never be met: {remaining} potentials, need {need}")]
    InvalidRequirement { remaining: usize, need: usize },

    #[error("invalid lock options: {0}")]
    InvalidOptions(String),

    /// Quorum not reached; the only error the retry policy retries
    #[error("requirement not met: {remaining} potentials, need {need}")]
    RequirementNotMet { remaining: usize, need: usize },

    #[error("could not take the lock of locks")]
    MetaLockUnavailable,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl LockError {
    /// Whether a failed attempt may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, LockError::RequirementNotMet { .. })
    }

    /// Whether this error was raised while building a lock
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            LockError::DuplicateKey(_)
                | LockError::InvalidRequirement { .. }
                | LockError::InvalidOptions(_)
        )
    }
}
