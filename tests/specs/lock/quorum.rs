//! Quorum specs
//!
//! Requirements need `need` of their potentials; impossible ones are
//! rejected before touching the backend.

use crate::prelude::*;

#[test]
fn impossible_requirement_is_rejected_immediately() {
    let mut requirement = Requirement::of(["a", "b", "c"]).with_need(5);

    let err = requirement.validate().unwrap_err();
    assert_eq!(err, LockError::RequirementNotMet { remaining: 3, need: 5 });
    assert_eq!(requirement.state(), RequirementState::Rejected);
}

#[tokio::test]
async fn impossible_requirement_never_reaches_the_backend() {
    let backend = MemoryBackend::new();
    let mut lock = Lock::new(backend.clone(), try_once()).unwrap();

    let err = lock
        .add_requirement(Requirement::of(["a", "b", "c"]).with_need(5))
        .unwrap_err();
    assert_eq!(err, LockError::InvalidRequirement { remaining: 3, need: 5 });
    assert!(lock.requirements().is_empty());
    assert!(backend.held_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn quorum_takes_exactly_need_potentials() {
    let backend = MemoryBackend::new();
    let mut lock = Lock::new(backend.clone(), try_once()).unwrap();
    lock.add_requirement(Requirement::of(names("gpu", 5)).with_need(3))
        .unwrap();

    let requirements = lock.acquire().await.unwrap();
    assert_eq!(requirements[0].fulfilled_count(), 3);
    assert_eq!(backend.held_keys().await.unwrap().len(), 3);

    lock.release();
    assert!(backend.held_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn quorum_routes_around_held_resources() {
    let backend = MemoryBackend::new();
    let mut squatter = Lock::from_items(backend.clone(), ["gpu-0", "gpu-1"], try_once()).unwrap();
    squatter.acquire().await.unwrap();

    let mut lock = Lock::new(backend.clone(), try_once()).unwrap();
    lock.add_requirement(Requirement::of(names("gpu", 4)).with_need(2))
        .unwrap();

    let requirements = lock.acquire().await.unwrap();
    let mut got: Vec<_> = requirements[0].fulfilled_items().cloned().collect();
    got.sort();
    assert_eq!(got, vec!["gpu-2".to_string(), "gpu-3".to_string()]);
}

#[tokio::test]
async fn all_requirements_or_nothing() {
    let backend = MemoryBackend::new();
    let mut squatter = Lock::from_items(backend.clone(), ["disk-0"], try_once()).unwrap();
    squatter.acquire().await.unwrap();

    let mut lock = Lock::new(backend.clone(), try_once()).unwrap();
    lock.add_requirement(Requirement::of(names("gpu", 2))).unwrap();
    lock.add_requirement(Requirement::of(names("disk", 1))).unwrap();

    assert!(lock.acquire().await.is_err());
    assert_eq!(
        backend.held_keys().await.unwrap(),
        HashSet::from(["disk-0".to_string()])
    );
}

#[tokio::test]
async fn options_from_toml_drive_a_lock() {
    let options = LockOptions::from_toml_str(
        r#"
        timeout = "0s"
        need = 1
        block = false
        "#,
    )
    .unwrap();

    let backend = MemoryBackend::new();
    let mut first = Lock::from_items(backend.clone(), ["a"], options.clone()).unwrap();
    let mut second = Lock::from_items(backend, ["a"], options).unwrap();

    first.acquire().await.unwrap();
    assert!(second.acquire().await.is_err());
}
