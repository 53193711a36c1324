//! Resource pool specs
//!
//! N actors each need K of M resources with capacity C. Usage adds up and
//! no resource ever exceeds its capacity.

use crate::prelude::*;

struct Pool {
    actors: usize,
    resources: usize,
    need: usize,
    capacity: usize,
    rounds: usize,
}

async fn run_pool<B: LockBackend>(backend: B, pool: Pool) {
    init_tracing();
    let resources = names("res", pool.resources);
    let occupancy = Occupancy::new(pool.capacity);
    let reporter = MemoryReporter::new();

    let actors: Vec<_> = (0..pool.actors)
        .map(|_| {
            tokio::spawn(actor(
                backend.clone(),
                resources.clone(),
                pool.need,
                pool.rounds,
                keep_trying(),
                occupancy.clone(),
                reporter.clone(),
            ))
        })
        .collect();
    for actor in actors {
        actor.await.unwrap();
    }

    let expected = pool.actors * pool.need * pool.rounds;
    assert_eq!(occupancy.total_uses(), expected);

    let reported = reported_uses(&reporter, &resources);
    assert_eq!(reported, occupancy.uses());
    assert_eq!(reported.values().sum::<usize>(), expected);
    assert!(backend.held_keys().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_fits_every_actor_at_once() {
    run_pool(
        MemoryBackend::with_capacity(3),
        Pool {
            actors: 6,
            resources: 4,
            need: 2,
            capacity: 3,
            rounds: 1,
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exclusive_pool_fits_every_actor_at_once() {
    run_pool(
        MemoryBackend::new(),
        Pool {
            actors: 4,
            resources: 8,
            need: 2,
            capacity: 1,
            rounds: 3,
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn oversubscribed_pool_takes_turns() {
    run_pool(
        MemoryBackend::new(),
        Pool {
            actors: 5,
            resources: 4,
            need: 2,
            capacity: 1,
            rounds: 6,
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lease_pool_takes_turns() {
    run_pool(
        LeaseBackend::new(),
        Pool {
            actors: 4,
            resources: 6,
            need: 3,
            capacity: 1,
            rounds: 4,
        },
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn quorum_of_every_resource_serialises_actors() {
    run_pool(
        MemoryBackend::new(),
        Pool {
            actors: 3,
            resources: 3,
            need: 3,
            capacity: 1,
            rounds: 5,
        },
    )
    .await;
}
