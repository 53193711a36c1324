// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::tags::tags;

#[test]
fn safe_normalises_separators() {
    assert_eq!(safe("  Render.Farm:eu_1 "), "render-farm-eu-1");
}

#[test]
fn counters_accumulate_per_tag_value() {
    let reporter = MemoryReporter::new();
    let a = tags([("key", "gpu-1"), ("pool", "render")]);
    let b = tags([("key", "gpu-2"), ("pool", "render")]);

    reporter.lock_requested(&a);
    reporter.lock_requested(&b);
    reporter.lock_success(Duration::from_millis(40), &a);
    reporter.lock_failed(&b);
    reporter.lock_released(Duration::from_millis(1500), &a);

    assert_eq!(reporter.all_tags(), vec!["key", "pool"]);
    assert_eq!(reporter.all_values("key"), vec!["gpu-1", "gpu-2"]);

    assert_eq!(reporter.aspect("key", "gpu-1", Aspect::LockAcquireCount), 1);
    assert_eq!(reporter.aspect("key", "gpu-1", Aspect::LockAcquireWait), 40);
    assert_eq!(reporter.aspect("key", "gpu-1", Aspect::LockReleaseWait), 1500);
    assert_eq!(reporter.aspect("key", "gpu-2", Aspect::LockAcquireFailCount), 1);
    assert_eq!(reporter.aspect("pool", "render", Aspect::LockRequestCount), 2);
    assert_eq!(reporter.aspect("key", "gpu-3", Aspect::LockRequestCount), 0);
}

#[test]
fn base_tags_are_merged_under_call_tags() {
    let reporter = MemoryReporter::new().with_base_tags(tags([("service", "ci"), ("pool", "default")]));
    reporter.lock_requested(&tags([("key", "a"), ("pool", "gpu")]));

    assert_eq!(reporter.all_values("service"), vec!["ci"]);
    assert_eq!(reporter.all_values("pool"), vec!["gpu"]);
}

#[test]
fn queries_normalise_their_arguments() {
    let reporter = MemoryReporter::new();
    reporter.lock_requested(&tags([("Key", "Build.Box")]));
    assert_eq!(reporter.aspect("key", "build-box", Aspect::LockRequestCount), 1);
    assert_eq!(reporter.aspect("KEY", "build.box", Aspect::LockRequestCount), 1);
}

#[test]
fn clones_share_one_store() {
    let reporter = MemoryReporter::new();
    let clone = reporter.clone();
    clone.lock_requested(&tags([("key", "a")]));
    assert_eq!(reporter.all_aspects("key", "a").len(), 1);

    reporter.clear();
    assert!(clone.all_tags().is_empty());
}

#[test]
fn snapshot_nests_tag_value_aspect() {
    let reporter = MemoryReporter::new();
    reporter.lock_failed(&tags([("key", "a")]));
    let snapshot = reporter.snapshot();
    assert_eq!(snapshot["key"]["a"]["lock_acquire_fail_count"], 1);
}

#[test]
fn aspects_parse_from_names() {
    for aspect in Aspect::ALL {
        assert_eq!(aspect.as_str().parse::<Aspect>().unwrap(), aspect);
    }
    assert!("lock_bogus".parse::<Aspect>().is_err());
}
