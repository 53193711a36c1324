// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced backend wrapper for consistent observability

use async_trait::async_trait;
use quorum_core::{BackendError, LockBackend, LockHandle, LockParams};
use std::collections::HashSet;
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any LockBackend
#[derive(Clone)]
pub struct TracedBackend<B> {
    inner: B,
}

impl<B> TracedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

/// Handle issued by [`TracedBackend`]
pub struct TracedHandle<H> {
    inner: H,
}

#[async_trait]
impl<H: LockHandle> LockHandle for TracedHandle<H> {
    fn key(&self) -> &str {
        self.inner.key()
    }

    async fn acquire(
        &self,
        blocking: bool,
        timeout: Option<Duration>,
    ) -> Result<bool, BackendError> {
        let key = self.inner.key();
        let span = tracing::info_span!("backend.acquire", key, blocking);

        async {
            // Precondition: keys must be non-empty
            if key.is_empty() {
                tracing::error!("empty lock key");
                return Err(BackendError::Other("lock key must not be empty".to_string()));
            }

            tracing::debug!(timeout_ms = timeout.map(|t| t.as_millis() as u64), "acquiring");
            let start = std::time::Instant::now();
            let result = self.inner.acquire(blocking, timeout).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(true) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "acquired"),
                Ok(false) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "not acquired"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "acquire failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn release(&self) -> Result<(), BackendError> {
        let span = tracing::info_span!("backend.release", key = self.inner.key());
        let _guard = span.enter();

        let result = self.inner.release();
        match &result {
            Ok(()) => tracing::info!("released"),
            Err(e) => tracing::warn!(error = %e, "release failed"),
        }

        result
    }
}

#[async_trait]
impl<B: LockBackend> LockBackend for TracedBackend<B> {
    type Handle = TracedHandle<B::Handle>;

    fn new_lock(&self, key: &str, params: LockParams) -> Self::Handle {
        tracing::trace!(
            key,
            expire_ms = params.expire.as_millis() as u64,
            auto_renewal = params.auto_renewal,
            "new lock"
        );
        TracedHandle {
            inner: self.inner.new_lock(key, params),
        }
    }

    async fn held_keys(&self) -> Result<HashSet<String>, BackendError> {
        let result = self.inner.held_keys().await;
        tracing::trace!(count = result.as_ref().map(|k| k.len()).ok(), "listed held keys");
        result
    }

    async fn clear_all(&self) -> Result<(), BackendError> {
        let span = tracing::info_span!("backend.clear_all");

        async {
            tracing::warn!("clearing all locks");
            let result = self.inner.clear_all().await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "clear failed");
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
