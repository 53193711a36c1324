// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reporter with a query surface
//!
//! Every tag name/value pair of a report gets its own counter set, so usage
//! can be broken down by key or by any other attribution tag.

use super::{Aspect, Reporter};
use crate::tags::Tags;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Store {
    /// tag name -> values seen
    values: BTreeMap<String, BTreeSet<String>>,
    /// (tag name, value) -> counters
    counters: BTreeMap<(String, String), BTreeMap<Aspect, u64>>,
}

/// Normalise a tag name or value for storage
pub(crate) fn safe(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '.' | ':' | '_') { '-' } else { c })
        .collect()
}

/// Reporter that aggregates counters in memory
#[derive(Clone, Default)]
pub struct MemoryReporter {
    base: Tags,
    store: Arc<Mutex<Store>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags merged under every reported call
    pub fn with_base_tags(mut self, tags: Tags) -> Self {
        self.base = tags;
        self
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store)
    }

    fn report(&self, tags: &Tags, increments: &[(Aspect, u64)]) {
        let mut request = self.base.clone();
        request.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.with_store(|store| {
            for (name, value) in &request {
                let name = safe(name);
                let value = safe(&value.to_string());
                store
                    .values
                    .entry(name.clone())
                    .or_default()
                    .insert(value.clone());
                let counters = store.counters.entry((name, value)).or_default();
                for &(aspect, by) in increments {
                    *counters.entry(aspect).or_default() += by;
                }
            }
        });
    }

    /// Every tag name seen, sorted
    pub fn all_tags(&self) -> Vec<String> {
        self.with_store(|s| s.values.keys().cloned().collect())
    }

    /// Every value seen for `tag`, sorted
    pub fn all_values(&self, tag: &str) -> Vec<String> {
        self.with_store(|s| {
            s.values
                .get(&safe(tag))
                .map(|v| v.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn all_aspects(&self, tag: &str, value: &str) -> BTreeMap<Aspect, u64> {
        self.with_store(|s| {
            s.counters
                .get(&(safe(tag), safe(value)))
                .cloned()
                .unwrap_or_default()
        })
    }

    /// Counter value, zero when never reported
    pub fn aspect(&self, tag: &str, value: &str, aspect: Aspect) -> u64 {
        self.all_aspects(tag, value)
            .get(&aspect)
            .copied()
            .unwrap_or(0)
    }

    /// All counters as `{tag: {value: {aspect: count}}}`
    pub fn snapshot(&self) -> serde_json::Value {
        self.with_store(|s| {
            let mut root = serde_json::Map::new();
            for ((tag, value), counters) in &s.counters {
                let aspects: serde_json::Map<String, serde_json::Value> = counters
                    .iter()
                    .map(|(a, n)| (a.as_str().to_string(), serde_json::Value::from(*n)))
                    .collect();
                let values = root
                    .entry(tag.clone())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                if let serde_json::Value::Object(values) = values {
                    values.insert(value.clone(), serde_json::Value::Object(aspects));
                }
            }
            serde_json::Value::Object(root)
        })
    }

    pub fn clear(&self) {
        self.with_store(|s| *s = Store::default());
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Reporter for MemoryReporter {
    fn lock_requested(&self, tags: &Tags) {
        self.report(tags, &[(Aspect::LockRequestCount, 1)]);
    }

    fn lock_success(&self, wait: Duration, tags: &Tags) {
        self.report(
            tags,
            &[
                (Aspect::LockAcquireCount, 1),
                (Aspect::LockAcquireWait, millis(wait)),
            ],
        );
    }

    fn lock_failed(&self, tags: &Tags) {
        self.report(tags, &[(Aspect::LockAcquireFailCount, 1)]);
    }

    fn lock_released(&self, held: Duration, tags: &Tags) {
        self.report(
            tags,
            &[
                (Aspect::LockReleaseCount, 1),
                (Aspect::LockReleaseWait, millis(held)),
            ],
        );
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
