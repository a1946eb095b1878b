//! End-to-end lock arbitration scenarios through the public API
//!
//! Each test follows one protocol-level interaction a NETCONF agent would
//! drive: competing global locks, dirty-candidate refusal, partial-lock
//! scoping, and the mutual exclusion between the two lock kinds.

use confstore::{
    DatastoreId, DatastoreRegistry, DatastoreState, Error, LockIdAllocator, LockSource,
    PartialLock, SessionId,
};

fn session(raw: u32) -> SessionId {
    SessionId::new(raw).unwrap()
}

fn ready_registry() -> DatastoreRegistry {
    let mut registry = DatastoreRegistry::new();
    for id in DatastoreId::ALL {
        registry.create_standard(id).unwrap();
        registry.set_state(id, DatastoreState::Ready);
    }
    registry
}

#[test]
fn competing_global_locks_first_wins() {
    let mut registry = ready_registry();

    registry
        .lock(DatastoreId::Running, session(5), LockSource::Netconf)
        .unwrap();
    let second = registry.lock(DatastoreId::Running, session(7), LockSource::Netconf);
    assert!(matches!(second, Err(Error::LockDenied)));

    let (holder, _) = registry
        .get(DatastoreId::Running)
        .unwrap()
        .global_lock_info()
        .unwrap();
    assert_eq!(holder, session(5));
}

#[test]
fn dirty_candidate_refuses_global_lock() {
    let mut registry = ready_registry();
    registry
        .get_mut(DatastoreId::Candidate)
        .unwrap()
        .set_dirty();

    let result = registry.lock(DatastoreId::Candidate, session(1), LockSource::Netconf);
    assert!(matches!(result, Err(Error::CandidateDirty)));
}

#[test]
fn partial_lock_refused_off_running_in_any_state() {
    let mut alloc = LockIdAllocator::new();
    for state in [
        DatastoreState::Init,
        DatastoreState::Ready,
        DatastoreState::Cleanup,
    ] {
        let mut registry = ready_registry();
        registry.set_state(DatastoreId::Candidate, state);

        let plock = PartialLock::new(alloc.next().unwrap(), session(2), Vec::new());
        let result = registry
            .get_mut(DatastoreId::Candidate)
            .unwrap()
            .add_partial_lock(plock);
        assert!(
            matches!(result, Err(Error::LockDenied)),
            "candidate in state {state} must refuse partial locks"
        );
    }
}

#[test]
fn global_lock_blocks_partial_and_vice_versa() {
    let mut alloc = LockIdAllocator::new();

    // global first, partial refused
    let mut registry = ready_registry();
    registry
        .lock(DatastoreId::Running, session(5), LockSource::Netconf)
        .unwrap();
    let plock = PartialLock::new(alloc.next().unwrap(), session(5), Vec::new());
    let result = registry
        .get_mut(DatastoreId::Running)
        .unwrap()
        .add_partial_lock(plock);
    assert!(result.is_err(), "global lock blocks partial locks");

    // partial first, global refused
    let mut registry = ready_registry();
    let plock = PartialLock::new(alloc.next().unwrap(), session(5), Vec::new());
    registry
        .get_mut(DatastoreId::Running)
        .unwrap()
        .add_partial_lock(plock)
        .unwrap();
    let result = registry.lock(DatastoreId::Running, session(5), LockSource::Netconf);
    assert!(
        matches!(result, Err(Error::LockDenied)),
        "partial locks block the global lock"
    );
}

#[test]
fn unlock_by_wrong_session_changes_nothing() {
    let mut registry = ready_registry();
    registry
        .lock(DatastoreId::Running, session(3), LockSource::Netconf)
        .unwrap();

    let result = registry.unlock(DatastoreId::Running, session(5));
    assert!(matches!(result, Err(Error::NoAccessLock)));

    let running = registry.get(DatastoreId::Running).unwrap();
    assert_eq!(running.state(), DatastoreState::GlobalLocked);
    assert_eq!(running.locked_by(), Some(session(3)));
}

#[test]
fn lookup_and_policy_surface() {
    let mut registry = ready_registry();
    assert_eq!(
        registry.lookup_by_name("running").unwrap().id(),
        Some(DatastoreId::Running)
    );

    // read allowed under both lock kinds
    registry
        .lock(DatastoreId::Startup, session(1), LockSource::Cli)
        .unwrap();
    assert!(registry.get(DatastoreId::Startup).unwrap().ok_to_read().is_ok());

    // write on a locked datastore is owner-only
    let startup = registry.get(DatastoreId::Startup).unwrap();
    assert!(startup.ok_to_write(session(1)).is_ok());
    assert!(matches!(
        startup.ok_to_write(session(2)),
        Err(Error::NoAccessLock)
    ));
}
