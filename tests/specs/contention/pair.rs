//! Two-actor contention specs
//!
//! Two locks wanting one of the same two keys may both hold at once, but
//! never on the same key.

use crate::prelude::*;

const ROUNDS: usize = 25;

async fn two_actors_never_share<B: LockBackend>(backend: B) {
    init_tracing();
    let resources = vec!["a".to_string(), "b".to_string()];
    let occupancy = Occupancy::new(1);
    let reporter = MemoryReporter::new();
    let options = keep_trying().with_auto_renewal(false);

    let actors: Vec<_> = (0..2)
        .map(|_| {
            tokio::spawn(actor(
                backend.clone(),
                resources.clone(),
                1,
                ROUNDS,
                options.clone(),
                occupancy.clone(),
                reporter.clone(),
            ))
        })
        .collect();
    for actor in actors {
        actor.await.unwrap();
    }

    assert_eq!(occupancy.total_uses(), 2 * ROUNDS);
    assert_eq!(reported_uses(&reporter, &resources), occupancy.uses());
    assert!(backend.held_keys().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_backend_pair_never_shares_a_key() {
    two_actors_never_share(MemoryBackend::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lease_backend_pair_never_shares_a_key() {
    two_actors_never_share(LeaseBackend::new()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pair_can_hold_both_keys_at_once() {
    let backend = MemoryBackend::new();
    let options = try_once().with_auto_renewal(false);
    let mut first = Lock::new(backend.clone(), options.clone()).unwrap();
    let mut second = Lock::new(backend.clone(), options).unwrap();
    first.add_requirement(Requirement::of(["a", "b"])).unwrap();
    second.add_requirement(Requirement::of(["a", "b"])).unwrap();

    let mine = first.acquire().await.unwrap()[0].get(0).copied();
    let theirs = second.acquire().await.unwrap()[0].get(0).copied();

    assert!(mine.is_some() && theirs.is_some());
    assert_ne!(mine, theirs);
}
