//! Datastore entities and the lock/access state machine
//!
//! Locking rules:
//! - a global lock and partial locks are mutually exclusive on the same
//!   datastore; every transition between the two lock states passes through
//!   `Ready`
//! - only the running datastore may carry partial locks
//! - a global lock on the candidate is refused while unconfirmed edits exist
//! - session termination force-releases locks, bypassing the owner guard
//!
//! A `Datastore` exclusively owns its root value tree and its queue of
//! partial lock control blocks; cross-datastore operations (the candidate
//! discard-changes cascade, session cleanup) live on the registry.

use chrono::{DateTime, Utc};
use confstore_core::{
    report_invariant, DatastoreId, DatastoreState, Error, LoadError, LockId, LockSource, Result,
    SessionId, TransactionId, ValueNode,
};
use tracing::warn;

use crate::plock::PartialLock;

/// One configuration datastore instance
///
/// Standard datastores (running, candidate, startup) are created by the
/// registry; dynamically created datastores live outside it and must be
/// flagged as write targets before they accept writes.
#[derive(Debug)]
pub struct Datastore {
    /// `None` for dynamically created, non-standard datastores
    id: Option<DatastoreId>,
    name: String,
    state: DatastoreState,
    root: Option<ValueNode>,
    target: bool,
    dirty: bool,
    locked_by: Option<SessionId>,
    lock_source: Option<LockSource>,
    lock_time: Option<DateTime<Utc>>,
    last_change_time: DateTime<Utc>,
    last_txid: TransactionId,
    cur_txid: TransactionId,
    partial_locks: Vec<PartialLock>,
    load_errors: Vec<LoadError>,
}

impl Datastore {
    /// Create one of the standard datastores
    ///
    /// Running and startup are bound to an empty config root; the candidate
    /// root stays absent until first synchronized from running.
    pub(crate) fn new_standard(id: DatastoreId) -> Self {
        let root = match id {
            DatastoreId::Candidate => None,
            DatastoreId::Running | DatastoreId::Startup => Some(ValueNode::config_root()),
        };
        Datastore {
            id: Some(id),
            name: id.name().to_string(),
            state: DatastoreState::Init,
            root,
            target: false,
            dirty: false,
            locked_by: None,
            lock_source: None,
            lock_time: None,
            last_change_time: Utc::now(),
            last_txid: TransactionId::INITIAL,
            cur_txid: TransactionId::INITIAL,
            partial_locks: Vec::new(),
            load_errors: Vec::new(),
        }
    }

    /// Create a dynamic, non-standard datastore
    ///
    /// The root stays absent until content is loaded, and the datastore is
    /// not a writable target until [`set_target`](Datastore::set_target) is
    /// called.
    pub fn new_dynamic(name: impl Into<String>) -> Self {
        Datastore {
            id: None,
            name: name.into(),
            state: DatastoreState::Init,
            root: None,
            target: false,
            dirty: false,
            locked_by: None,
            lock_source: None,
            lock_time: None,
            last_change_time: Utc::now(),
            last_txid: TransactionId::INITIAL,
            cur_txid: TransactionId::INITIAL,
            partial_locks: Vec::new(),
            load_errors: Vec::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Standard id, or `None` for dynamic datastores
    pub fn id(&self) -> Option<DatastoreId> {
        self.id
    }

    /// Datastore name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub fn state(&self) -> DatastoreState {
        self.state
    }

    /// Change the state
    ///
    /// Used by the host to move a datastore out of `Init` once its initial
    /// content is loaded, and into `Cleanup` at shutdown. Lock transitions go
    /// through the lock operations, not here.
    pub fn set_state(&mut self, state: DatastoreState) {
        self.state = state;
    }

    /// Configuration content root, absent until loaded or synchronized
    pub fn root(&self) -> Option<&ValueNode> {
        self.root.as_ref()
    }

    /// Mutable access to the content root
    pub fn root_mut(&mut self) -> Option<&mut ValueNode> {
        self.root.as_mut()
    }

    pub(crate) fn take_root(&mut self) -> Option<ValueNode> {
        self.root.take()
    }

    pub(crate) fn set_root(&mut self, root: Option<ValueNode>) {
        self.root = root;
    }

    /// Session holding the global lock, while one is active
    pub fn locked_by(&self) -> Option<SessionId> {
        self.locked_by
    }

    /// Source of the active global lock
    pub fn lock_source(&self) -> Option<LockSource> {
        self.lock_source
    }

    /// Timestamp of the last content change
    pub fn last_change_time(&self) -> DateTime<Utc> {
        self.last_change_time
    }

    /// Record the current time as the last content change
    pub fn touch_last_change_time(&mut self) {
        self.last_change_time = Utc::now();
    }

    /// Last applied transaction id
    pub fn last_txid(&self) -> TransactionId {
        self.last_txid
    }

    /// Update the last applied transaction id
    pub fn set_last_txid(&mut self, txid: TransactionId) {
        self.last_txid = txid;
    }

    /// Transaction id of the write operation in progress, if any
    pub fn cur_txid(&self) -> TransactionId {
        self.cur_txid
    }

    /// Set the transaction id of the write operation in progress
    pub fn set_cur_txid(&mut self, txid: TransactionId) {
        self.cur_txid = txid;
    }

    pub(crate) fn reset_cur_txid(&mut self) {
        self.cur_txid = TransactionId::INITIAL;
    }

    // =========================================================================
    // Flags
    // =========================================================================

    /// Mark this datastore as a valid write target
    pub fn set_target(&mut self) {
        self.target = true;
    }

    /// Mark the datastore as carrying unconfirmed edits
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the datastore carries unconfirmed edits
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // =========================================================================
    // Global lock policy and transitions
    // =========================================================================

    /// Check whether a global lock can be granted right now
    pub fn ok_to_lock(&self) -> Result<()> {
        match self.state {
            DatastoreState::Ready => {
                // the lock cannot be granted if changes to the candidate
                // are already made
                if self.id == Some(DatastoreId::Candidate) && self.dirty {
                    Err(Error::CandidateDirty)
                } else {
                    Ok(())
                }
            }
            DatastoreState::PartialLocked | DatastoreState::GlobalLocked => Err(Error::LockDenied),
            DatastoreState::None | DatastoreState::Init | DatastoreState::Cleanup => {
                Err(Error::NoAccessState(self.state))
            }
        }
    }

    /// Check whether the given session can release the global lock right now
    pub fn ok_to_unlock(&self, session: SessionId) -> Result<()> {
        match self.state {
            DatastoreState::GlobalLocked => {
                if self.locked_by == Some(session) {
                    Ok(())
                } else {
                    Err(Error::NoAccessLock)
                }
            }
            DatastoreState::None
            | DatastoreState::Init
            | DatastoreState::Ready
            | DatastoreState::PartialLocked
            | DatastoreState::Cleanup => Err(Error::NoAccessState(self.state)),
        }
    }

    /// Acquire the global lock for `session`
    pub fn lock(&mut self, session: SessionId, source: LockSource) -> Result<()> {
        self.ok_to_lock()?;
        self.state = DatastoreState::GlobalLocked;
        self.locked_by = Some(session);
        self.lock_source = Some(source);
        self.lock_time = Some(Utc::now());
        Ok(())
    }

    /// Release the global lock held by `session`
    ///
    /// Owner-checked. The candidate discard-changes cascade is applied by the
    /// registry's unlock, which wraps this.
    pub fn release_global_lock(&mut self, session: SessionId) -> Result<()> {
        self.ok_to_unlock(session)?;
        self.clear_global_lock();
        Ok(())
    }

    /// Forced release at session end; bypasses the owner guard.
    pub(crate) fn clear_global_lock(&mut self) {
        self.state = DatastoreState::Ready;
        self.locked_by = None;
        self.lock_source = None;
        self.lock_time = None;
    }

    /// Whether a global lock is active
    pub fn is_global_locked(&self) -> bool {
        self.state == DatastoreState::GlobalLocked
    }

    /// Holder and grant time of the active global lock
    ///
    /// Fails with `NotLocked` while no global lock is active.
    pub fn global_lock_info(&self) -> Result<(SessionId, DateTime<Utc>)> {
        if self.state != DatastoreState::GlobalLocked {
            return Err(Error::NotLocked);
        }
        match (self.locked_by, self.lock_time) {
            (Some(session), Some(time)) => Ok((session, time)),
            _ => {
                report_invariant("global-locked datastore is missing its owner fields");
                Err(Error::InternalValue("global lock owner fields missing"))
            }
        }
    }

    // =========================================================================
    // Partial lock collection
    // =========================================================================

    /// Check whether a partial lock can be granted right now
    ///
    /// Only the running datastore may carry partial locks; a held global lock
    /// blocks them.
    pub fn ok_to_partial_lock(&self) -> Result<()> {
        if self.id != Some(DatastoreId::Running) {
            return Err(Error::LockDenied);
        }
        match self.state {
            DatastoreState::Ready | DatastoreState::PartialLocked => Ok(()),
            DatastoreState::GlobalLocked
            | DatastoreState::None
            | DatastoreState::Init
            | DatastoreState::Cleanup => Err(Error::NoAccessState(self.state)),
        }
    }

    /// Add a granted partial lock to this datastore
    ///
    /// On success the control block is owned by the datastore until it is
    /// removed by [`delete_partial_lock`](Datastore::delete_partial_lock) or
    /// the session releaser.
    pub fn add_partial_lock(&mut self, plock: PartialLock) -> Result<()> {
        self.ok_to_partial_lock()?;
        self.state = DatastoreState::PartialLocked;
        self.partial_locks.push(plock);
        Ok(())
    }

    /// Find an active partial lock by id
    pub fn find_partial_lock(&self, lock_id: LockId) -> Option<&PartialLock> {
        self.partial_locks.iter().find(|p| p.lock_id() == lock_id)
    }

    /// Active partial locks in grant order
    pub fn partial_locks(&self) -> impl Iterator<Item = &PartialLock> {
        self.partial_locks.iter()
    }

    /// Whether any partial lock is active
    pub fn is_partial_locked(&self) -> bool {
        self.state == DatastoreState::PartialLocked
    }

    /// Remove and free the partial lock with the given id
    ///
    /// Clears the lock's back-references from the content tree and drops the
    /// control block. The state returns to `Ready` once the last partial lock
    /// is gone. No-op (with an invariant report) if the datastore is not
    /// partial-locked.
    pub fn delete_partial_lock(&mut self, lock_id: LockId) {
        if self.state != DatastoreState::PartialLocked {
            report_invariant("delete_partial_lock on a datastore without partial locks");
            return;
        }
        if let Some(pos) = self
            .partial_locks
            .iter()
            .position(|p| p.lock_id() == lock_id)
        {
            let plock = self.partial_locks.remove(pos);
            if let Some(root) = self.root.as_mut() {
                root.clear_partial_lock(plock.lock_id());
            }
            self.state = if self.partial_locks.is_empty() {
                DatastoreState::Ready
            } else {
                DatastoreState::PartialLocked
            };
        }
    }

    // =========================================================================
    // Access policy
    // =========================================================================

    /// Check whether the datastore can be read right now
    pub fn ok_to_read(&self) -> Result<()> {
        match self.state {
            DatastoreState::Init
            | DatastoreState::Ready
            | DatastoreState::PartialLocked
            | DatastoreState::GlobalLocked => Ok(()),
            DatastoreState::None | DatastoreState::Cleanup => Err(Error::NoAccessState(self.state)),
        }
    }

    /// Check whether `session` can write to the datastore right now
    ///
    /// This is not an access control check; only locks and datastore state
    /// are consulted. Node-level partial-lock scoping is the value tree's
    /// concern.
    pub fn ok_to_write(&self, session: SessionId) -> Result<()> {
        // writable-target check, bypassed during boot: standard datastores
        // are always valid targets, dynamic ones must be flagged
        if self.state != DatastoreState::Init && self.id.is_none() && !self.target {
            return Err(Error::NotWritable);
        }
        match self.state {
            // root-level access is fine under partial locks
            DatastoreState::PartialLocked => Ok(()),
            DatastoreState::GlobalLocked => {
                if self.locked_by == Some(session) {
                    Ok(())
                } else {
                    Err(Error::NoAccessLock)
                }
            }
            DatastoreState::Init | DatastoreState::Ready => Ok(()),
            DatastoreState::None | DatastoreState::Cleanup => Err(Error::NoAccessState(self.state)),
        }
    }

    // =========================================================================
    // Content operations
    // =========================================================================

    /// Replace the content root wholesale
    ///
    /// Used for bulk load at agent boot. Warns (non-fatally) if the existing
    /// root already had children.
    pub fn apply_load_root(&mut self, new_root: ValueNode) {
        if let Some(root) = &self.root {
            if root.child_count() > 0 {
                warn!(datastore = %self.name, "config root already has child nodes");
            }
        }
        self.touch_last_change_time();
        self.root = Some(new_root);
    }

    /// Record a load-time diagnostic
    pub fn push_load_error(&mut self, error: LoadError) {
        self.load_errors.push(error);
    }

    /// Load-time diagnostics collected so far, in order
    pub fn load_errors(&self) -> &[LoadError] {
        &self.load_errors
    }
}
