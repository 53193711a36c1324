//! Single-key exclusion specs
//!
//! One holder per key; a refused lock succeeds once the holder releases.

use crate::prelude::*;

async fn second_lock_waits_for_first<B: LockBackend>(backend: B) {
    let mut first = Lock::from_items(backend.clone(), ["a"], LockOptions::new()).unwrap();
    first.acquire().await.unwrap();

    let mut second = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();
    let err = second.acquire().await.unwrap_err();
    assert!(matches!(err, LockError::RequirementNotMet { .. }), "{err}");
    assert!(!second.is_held());

    first.release();
    let requirements = second.acquire().await.unwrap();
    assert_eq!(requirements[0].get(0), Some(&"a"));
}

#[tokio::test]
async fn memory_backend_second_lock_refused_until_release() {
    init_tracing();
    second_lock_waits_for_first(MemoryBackend::new()).await;
}

#[tokio::test]
async fn lease_backend_second_lock_refused_until_release() {
    init_tracing();
    second_lock_waits_for_first(LeaseBackend::new()).await;
}

#[tokio::test]
async fn traced_backend_second_lock_refused_until_release() {
    init_tracing();
    second_lock_waits_for_first(TracedBackend::new(MemoryBackend::new())).await;
}

#[tokio::test]
async fn guard_releases_at_end_of_scope() {
    let backend = MemoryBackend::new();
    let mut first = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();
    let mut second = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();

    {
        let held = first.guard().await.unwrap();
        assert_eq!(held[0].get(0), Some(&"a"));
        assert!(second.acquire().await.is_err());
    }

    assert!(second.acquire().await.is_ok());
}

#[tokio::test]
async fn guard_releases_on_early_return() {
    async fn use_then_bail(lock: &mut Lock<MemoryBackend, &'static str>) -> Result<(), LockError> {
        let _held = lock.guard().await?;
        Err(LockError::MetaLockUnavailable)
    }

    let backend = MemoryBackend::new();
    let mut lock = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();
    assert!(use_then_bail(&mut lock).await.is_err());

    assert!(backend.held_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn blocking_lock_waits_out_the_holder() {
    let backend = MemoryBackend::new();
    let mut first = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();
    first.acquire().await.unwrap();

    let waiter = tokio::spawn({
        let backend = backend.clone();
        async move {
            let mut second = Lock::from_items(backend, ["a"], LockOptions::new()).unwrap();
            second.acquire().await.map(|_| ())
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());
    first.release();

    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn expired_lease_is_taken_over() {
    let backend = LeaseBackend::new();
    let options = try_once()
        .with_expire(Duration::from_millis(30))
        .with_auto_renewal(false);
    let mut first = Lock::from_items(backend.clone(), ["a"], options.clone()).unwrap();
    first.acquire().await.unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;

    let mut second = Lock::from_items(backend.clone(), ["a"], options).unwrap();
    second.acquire().await.unwrap();

    // Release failures are logged, never raised
    first.release();
    assert!(!first.is_held());
    assert_eq!(backend.held_keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn renewed_lease_outlives_its_expire() {
    let backend = LeaseBackend::new();
    let options = try_once().with_expire(Duration::from_millis(45));
    let mut first = Lock::from_items(backend.clone(), ["a"], options.clone()).unwrap();
    first.acquire().await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut second = Lock::from_items(backend.clone(), ["a"], options).unwrap();
    assert!(second.acquire().await.is_err());
    first.release();
    assert!(second.acquire().await.is_ok());
}

async fn abandoned_acquire_frees_the_lock_of_locks<B: LockBackend>(backend: B) {
    let mut first = Lock::from_items(backend.clone(), ["a"], try_once()).unwrap();
    first.acquire().await.unwrap();

    let mut second = Lock::from_items(backend.clone(), ["a"], LockOptions::new()).unwrap();
    let abandoned = tokio::time::timeout(Duration::from_millis(50), second.acquire()).await;
    assert!(abandoned.is_err());
    second.release();
    first.release();

    assert!(backend.held_keys().await.unwrap().is_empty());

    let mut third = Lock::from_items(backend.clone(), ["b"], try_once()).unwrap();
    let done = tokio::time::timeout(Duration::from_secs(2), third.acquire()).await;
    assert!(matches!(done, Ok(Ok(_))));
}

#[tokio::test]
async fn memory_backend_abandoned_acquire_frees_the_lock_of_locks() {
    abandoned_acquire_frees_the_lock_of_locks(MemoryBackend::new()).await;
}

#[tokio::test]
async fn lease_backend_abandoned_acquire_frees_the_lock_of_locks() {
    abandoned_acquire_frees_the_lock_of_locks(LeaseBackend::new()).await;
}
