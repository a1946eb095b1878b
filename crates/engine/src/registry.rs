//! Registry of the standard configuration datastores
//!
//! The registry is an explicit, process-lifetime value owned by the host
//! application and passed into request handlers; there is no global state.
//! It owns the three standard datastores, the candidate synchronization
//! operations that are coupled to lock release, and the session-termination
//! cleanup cascade.
//!
//! The broker performs no internal locking: operations take `&mut self` and
//! rely on the caller serializing requests (one RPC at a time). A session's
//! termination cleanup must complete before its id is reused.

use confstore_core::{
    report_invariant, DatastoreId, DatastoreState, Error, Limits, LockId, LockSource, Result,
    SessionId, ValueNode,
};
use tracing::{error, info};

use crate::datastore::Datastore;

/// Fixed-size table of the standard configuration datastores
#[derive(Debug)]
pub struct DatastoreRegistry {
    slots: [Option<Datastore>; DatastoreId::COUNT],
    limits: Limits,
}

impl DatastoreRegistry {
    /// Create an empty registry with default value-tree limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an empty registry with custom value-tree limits
    ///
    /// The limits are fixed for the lifetime of the registry and bound every
    /// candidate synchronization clone.
    pub fn with_limits(limits: Limits) -> Self {
        DatastoreRegistry {
            slots: [None, None, None],
            limits,
        }
    }

    /// Value-tree limits this registry enforces
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create one of the standard datastores
    ///
    /// Fails with `InternalValue` if the slot is already populated.
    pub fn create_standard(&mut self, id: DatastoreId) -> Result<()> {
        let slot = &mut self.slots[id.as_index()];
        if slot.is_some() {
            report_invariant("standard datastore created twice");
            return Err(Error::InternalValue("datastore already created"));
        }
        *slot = Some(Datastore::new_standard(id));
        Ok(())
    }

    /// Tear down every standard datastore
    ///
    /// Drops roots, partial lock collections, and load errors, and empties
    /// the table so `create_standard` may run again.
    pub fn teardown(&mut self) {
        for slot in &mut self.slots {
            if let Some(cfg) = slot.as_mut() {
                cfg.set_state(DatastoreState::Cleanup);
            }
            *slot = None;
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Datastore by id
    pub fn get(&self, id: DatastoreId) -> Option<&Datastore> {
        self.slots[id.as_index()].as_ref()
    }

    /// Datastore by id, mutably
    pub fn get_mut(&mut self, id: DatastoreId) -> Option<&mut Datastore> {
        self.slots[id.as_index()].as_mut()
    }

    /// Datastore by name
    pub fn lookup_by_name(&self, name: &str) -> Option<&Datastore> {
        self.slots.iter().flatten().find(|cfg| cfg.name() == name)
    }

    /// Datastore by name, mutably
    pub fn lookup_by_name_mut(&mut self, name: &str) -> Option<&mut Datastore> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|cfg| cfg.name() == name)
    }

    /// Name of a datastore, if created
    pub fn name_of(&self, id: DatastoreId) -> Option<&str> {
        self.get(id).map(Datastore::name)
    }

    /// Content root of a datastore, if created and loaded
    pub fn root(&self, id: DatastoreId) -> Option<&ValueNode> {
        self.get(id).and_then(Datastore::root)
    }

    /// State of a datastore; `None` state if it was never created
    pub fn state_of(&self, id: DatastoreId) -> DatastoreState {
        self.get(id)
            .map_or(DatastoreState::None, Datastore::state)
    }

    /// Change the state of a standard datastore
    pub fn set_state(&mut self, id: DatastoreId, state: DatastoreState) {
        match self.get_mut(id) {
            Some(cfg) => cfg.set_state(state),
            None => report_invariant("set_state on a datastore that was never created"),
        }
    }

    // =========================================================================
    // Global locks
    // =========================================================================

    /// Acquire the global lock on a datastore for `session`
    pub fn lock(&mut self, id: DatastoreId, session: SessionId, source: LockSource) -> Result<()> {
        let cfg = self
            .get_mut(id)
            .ok_or(Error::NoAccessState(DatastoreState::None))?;
        cfg.lock(session, source)
    }

    /// Release the global lock on a datastore held by `session`
    ///
    /// Releasing the candidate's lock triggers a discard-changes: the
    /// candidate is refilled from running and the result of that
    /// synchronization becomes the result of this call. The lock itself is
    /// already released when the synchronization fails.
    pub fn unlock(&mut self, id: DatastoreId, session: SessionId) -> Result<()> {
        let cfg = self
            .get_mut(id)
            .ok_or(Error::NoAccessState(DatastoreState::None))?;
        cfg.release_global_lock(session)?;

        if id == DatastoreId::Candidate {
            return self.fill_candidate_from_running();
        }
        Ok(())
    }

    /// Names of the datastores whose global lock `session` holds
    pub fn lock_list(&self, session: SessionId) -> Vec<String> {
        DatastoreId::ALL
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(|cfg| cfg.locked_by() == Some(session))
            .map(|cfg| cfg.name().to_string())
            .collect()
    }

    // =========================================================================
    // Session termination cleanup
    // =========================================================================

    /// Release every lock held by the given session
    ///
    /// No-op for `None` (the "no session" case). This is the one path that
    /// bypasses the owner guard: session termination must always succeed in
    /// releasing resources. A discard-changes failure during the forced
    /// candidate release is logged and not propagated.
    pub fn release_locks(&mut self, session: Option<SessionId>) {
        let Some(session) = session else {
            return;
        };

        self.release_partial_locks(session);

        for id in DatastoreId::ALL {
            let holds = self
                .get(id)
                .is_some_and(|cfg| cfg.locked_by() == Some(session));
            if !holds {
                continue;
            }
            if let Some(cfg) = self.get_mut(id) {
                cfg.clear_global_lock();
                info!(
                    datastore = id.name(),
                    session = %session,
                    "forced global unlock at session end"
                );
            }

            // a released candidate lock always discards unconfirmed edits
            if id == DatastoreId::Candidate {
                if let Err(err) = self.fill_candidate_from_running() {
                    error!(%err, "discard-changes failed during session cleanup");
                }
            }
        }
    }

    /// Release every partial lock held by the given session
    ///
    /// Partial locks exist only on the running datastore.
    pub fn release_partial_locks(&mut self, session: SessionId) {
        let Some(cfg) = self.get_mut(DatastoreId::Running) else {
            return;
        };
        let held: Vec<LockId> = cfg
            .partial_locks()
            .filter(|p| p.session() == session)
            .map(|p| p.lock_id())
            .collect();
        for lock_id in held {
            info!(
                lock_id = %lock_id,
                session = %session,
                "forced partial unlock on running config at session end"
            );
            cfg.delete_partial_lock(lock_id);
        }
    }

    // =========================================================================
    // Candidate synchronization
    // =========================================================================

    /// Fill the candidate with the configuration content of running
    ///
    /// Discards the current candidate content, clones running's config-only
    /// data, clears the dirty flag, copies running's last transaction id, and
    /// resets the current transaction id.
    pub fn fill_candidate_from_running(&mut self) -> Result<()> {
        self.fill_candidate(DatastoreId::Running, true)
    }

    /// Fill the candidate with the content of startup
    ///
    /// Same shape as [`Self::fill_candidate_from_running`], but sourced from
    /// startup using an unfiltered clone.
    pub fn fill_candidate_from_startup(&mut self) -> Result<()> {
        self.fill_candidate(DatastoreId::Startup, false)
    }

    fn fill_candidate(&mut self, source_id: DatastoreId, config_only: bool) -> Result<()> {
        if self.get(source_id).is_none() || self.get(DatastoreId::Candidate).is_none() {
            report_invariant("candidate fill before the standard datastores exist");
            return Err(Error::InternalValue("standard datastores not created"));
        }
        if self.root(source_id).is_none() {
            return Err(Error::DataMissing);
        }

        // The previous candidate content is discarded before the clone is
        // attempted; a failed clone leaves the candidate with no root, which
        // callers detect as a missing datastore content.
        if let Some(candidate) = self.get_mut(DatastoreId::Candidate) {
            candidate.take_root();
        }

        let clone_result = match self.root(source_id) {
            Some(root) => {
                if config_only {
                    root.clone_config_data(&self.limits)
                } else {
                    root.try_clone(&self.limits)
                }
            }
            None => Err(Error::DataMissing),
        };
        let source_txid = self
            .get(source_id)
            .map(Datastore::last_txid)
            .unwrap_or_default();

        if let Some(candidate) = self.get_mut(DatastoreId::Candidate) {
            candidate.clear_dirty();
            candidate.set_last_txid(source_txid);
            candidate.reset_cur_txid();
            match clone_result {
                Ok(root) => {
                    candidate.set_root(Some(root));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::InternalValue("candidate datastore disappeared"))
    }

    /// Fill the candidate with externally supplied content
    ///
    /// Clones the configuration data of `new_root` (e.g. an inline
    /// `<config>` payload) into the candidate and clears the dirty flag.
    /// Transaction ids are untouched.
    pub fn fill_candidate_from_inline(&mut self, new_root: &ValueNode) -> Result<()> {
        if self.get(DatastoreId::Candidate).is_none() {
            report_invariant("candidate fill before the candidate datastore exists");
            return Err(Error::InternalValue("candidate datastore not created"));
        }

        // same discard-before-clone ordering as the datastore-sourced fills
        if let Some(candidate) = self.get_mut(DatastoreId::Candidate) {
            candidate.take_root();
        }

        let clone_result = new_root.clone_config_data(&self.limits);

        if let Some(candidate) = self.get_mut(DatastoreId::Candidate) {
            candidate.clear_dirty();
            match clone_result {
                Ok(root) => {
                    candidate.set_root(Some(root));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::InternalValue("candidate datastore disappeared"))
    }
}

impl Default for DatastoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
