//! Partial lock control blocks
//!
//! Support for RFC 5717 `<partial-lock>` operations. A control block records
//! one granted partial lock: its id, the owning session, the select
//! expressions that scoped it, and when it was granted. Once added to a
//! datastore the block is owned by that datastore and freed on removal.
//!
//! Subtree-overlap detection between concurrent partial locks is evaluated
//! against the value tree by the select-expression layer, not here.

use chrono::{DateTime, Utc};
use confstore_core::{Error, LockId, Result, SessionId};

/// One granted partial lock
#[derive(Debug, Clone)]
pub struct PartialLock {
    lock_id: LockId,
    session: SessionId,
    select: Vec<String>,
    locked_time: DateTime<Utc>,
}

impl PartialLock {
    /// Create a control block for a newly granted partial lock
    ///
    /// `select` holds the select expressions from the request, in request
    /// order.
    pub fn new(lock_id: LockId, session: SessionId, select: Vec<String>) -> Self {
        PartialLock {
            lock_id,
            session,
            select,
            locked_time: Utc::now(),
        }
    }

    /// Protocol-visible id of this lock
    pub fn lock_id(&self) -> LockId {
        self.lock_id
    }

    /// Session that owns this lock
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Select expressions that scoped this lock
    pub fn select(&self) -> &[String] {
        &self.select
    }

    /// When the lock was granted
    pub fn locked_time(&self) -> DateTime<Utc> {
        self.locked_time
    }
}

/// Allocator for protocol-visible partial lock ids
///
/// Ids start at 1 and increase monotonically for the lifetime of the host.
/// Only the caller maintaining the lock collections can decide whether the id
/// space may roll over, so [`reset`](LockIdAllocator::reset) is explicit.
#[derive(Debug, Default)]
pub struct LockIdAllocator {
    last_id: u32,
}

impl LockIdAllocator {
    /// Create an allocator whose first id will be 1
    pub fn new() -> Self {
        LockIdAllocator { last_id: 0 }
    }

    /// Allocate the next lock id
    ///
    /// Fails with `ResourceDenied` once the id space is exhausted; see
    /// [`reset`](LockIdAllocator::reset).
    pub fn next(&mut self) -> Result<LockId> {
        if self.last_id == u32::MAX {
            return Err(Error::ResourceDenied);
        }
        self.last_id += 1;
        Ok(LockId::new(self.last_id))
    }

    /// Roll the id space over, if it is exhausted
    ///
    /// No-op while ids remain; the caller must first ensure no allocated ids
    /// are still live.
    pub fn reset(&mut self) {
        if self.last_id == u32::MAX {
            self.last_id = 0;
        }
    }
}
