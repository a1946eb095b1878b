//! Core types for the configuration datastore broker
//!
//! This module defines the foundational types:
//! - DatastoreId: identifier for the standard configuration datastores
//! - DatastoreState: lifecycle/lock state of one datastore
//! - SessionId: identity of the client session holding a lock
//! - LockId: identifier of one partial lock
//! - TransactionId: marker of the last/current applied change set
//! - LockSource: classification of where a global lock request came from
//! - LoadError: opaque load-time diagnostic record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Identifier for one of the standard configuration datastores
///
/// The set is closed and the ordinal order is fixed
/// (`Running < Candidate < Startup`); the registry uses the ordinal as its
/// array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DatastoreId {
    /// The `<running>` datastore: the currently active configuration
    Running,
    /// The `<candidate>` datastore: a scratch configuration awaiting commit
    Candidate,
    /// The `<startup>` datastore: the configuration loaded at boot
    Startup,
}

impl DatastoreId {
    /// Number of standard datastores
    pub const COUNT: usize = 3;

    /// All standard datastore ids in ordinal order
    pub const ALL: [DatastoreId; DatastoreId::COUNT] = [
        DatastoreId::Running,
        DatastoreId::Candidate,
        DatastoreId::Startup,
    ];

    /// Ordinal index of this id, suitable for array indexing
    #[inline]
    pub const fn as_index(self) -> usize {
        self as usize
    }

    /// Convert an ordinal index back to an id
    ///
    /// Returns `None` for out-of-range indices.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(DatastoreId::Running),
            1 => Some(DatastoreId::Candidate),
            2 => Some(DatastoreId::Startup),
            _ => None,
        }
    }

    /// Canonical protocol name of the datastore
    pub const fn name(self) -> &'static str {
        match self {
            DatastoreId::Running => "running",
            DatastoreId::Candidate => "candidate",
            DatastoreId::Startup => "startup",
        }
    }
}

impl fmt::Display for DatastoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle and lock state of one datastore
///
/// Exactly one value applies to a datastore at any time. `GlobalLocked` and
/// `PartialLocked` are mutually unreachable from one another; every transition
/// between them passes through `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatastoreState {
    /// Not set (the datastore does not exist or was torn down)
    None,
    /// Initial content load in progress
    Init,
    /// Ready for protocol operations, no locks active
    Ready,
    /// One or more partial locks active
    PartialLocked,
    /// Exclusive whole-datastore lock active
    GlobalLocked,
    /// Shutdown in progress
    Cleanup,
}

impl DatastoreState {
    /// Short lowercase name, used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            DatastoreState::None => "none",
            DatastoreState::Init => "init",
            DatastoreState::Ready => "ready",
            DatastoreState::PartialLocked => "partial-locked",
            DatastoreState::GlobalLocked => "global-locked",
            DatastoreState::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for DatastoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a client session
///
/// Session ids are small protocol-assigned integers. The wire protocol
/// reserves 0 as "no session"; that sentinel is modeled here as
/// `Option<SessionId>` instead, so a `SessionId` value is always a real
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(NonZeroU32);

impl SessionId {
    /// Create a session id from its raw protocol value
    ///
    /// Returns `None` for 0, the protocol's "no session" sentinel.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(SessionId)
    }

    /// Raw protocol value of this session id (never 0)
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one partial lock
///
/// Matches the protocol's lock-id-type. Ids are handed out by the partial-lock
/// id allocator starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockId(u32);

impl LockId {
    /// Create a lock id from its raw value
    #[inline]
    pub const fn new(raw: u32) -> Self {
        LockId(raw)
    }

    /// Raw value of this lock id
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker of one applied change set on a datastore
///
/// Transaction ids are scoped to a single session write operation on a
/// datastore and tracked for synchronization bookkeeping only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// The initial transaction id of a freshly created or resynchronized
    /// datastore
    pub const INITIAL: TransactionId = TransactionId(0);

    /// Create a transaction id from its raw value
    #[inline]
    pub const fn new(raw: u64) -> Self {
        TransactionId(raw)
    }

    /// Raw value of this transaction id
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The transaction id following this one
    #[inline]
    pub const fn next(self) -> Self {
        TransactionId(self.0 + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of where a global lock request came from
///
/// Recorded on the datastore while the lock is held; absence of a lock is
/// modeled as `Option<LockSource>` on the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockSource {
    /// Internal agent operation
    Internal,
    /// NETCONF session request
    Netconf,
    /// Command-line interface
    Cli,
    /// SNMP agent
    Snmp,
    /// HTTP/RESTCONF front end
    Http,
    /// Any other management interface
    Other,
}

/// One load-time diagnostic record
///
/// Collected on a datastore while its initial content is loaded; opaque to the
/// lock broker itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadError {
    /// Path of the offending node, as reported by the loader
    pub path: String,
    /// Human-readable description of the problem
    pub message: String,
}

impl LoadError {
    /// Create a load error record
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // DatastoreId Tests
    // ========================================

    #[test]
    fn test_datastore_id_ordinal_order() {
        assert!(DatastoreId::Running < DatastoreId::Candidate);
        assert!(DatastoreId::Candidate < DatastoreId::Startup);
    }

    #[test]
    fn test_datastore_id_index_roundtrip() {
        for id in DatastoreId::ALL {
            assert_eq!(DatastoreId::from_index(id.as_index()), Some(id));
        }
    }

    #[test]
    fn test_datastore_id_from_index_out_of_range() {
        assert_eq!(DatastoreId::from_index(DatastoreId::COUNT), None);
        assert_eq!(DatastoreId::from_index(usize::MAX), None);
    }

    #[test]
    fn test_datastore_id_names() {
        assert_eq!(DatastoreId::Running.name(), "running");
        assert_eq!(DatastoreId::Candidate.name(), "candidate");
        assert_eq!(DatastoreId::Startup.name(), "startup");
        assert_eq!(format!("{}", DatastoreId::Running), "running");
    }

    #[test]
    fn test_datastore_id_serialization() {
        for id in DatastoreId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            let restored: DatastoreId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, restored, "DatastoreId {:?} should roundtrip", id);
        }
    }

    // ========================================
    // DatastoreState Tests
    // ========================================

    #[test]
    fn test_datastore_state_display() {
        assert_eq!(format!("{}", DatastoreState::Ready), "ready");
        assert_eq!(format!("{}", DatastoreState::GlobalLocked), "global-locked");
        assert_eq!(
            format!("{}", DatastoreState::PartialLocked),
            "partial-locked"
        );
    }

    // ========================================
    // SessionId Tests
    // ========================================

    #[test]
    fn test_session_id_rejects_zero() {
        assert!(SessionId::new(0).is_none(), "0 is the no-session sentinel");
    }

    #[test]
    fn test_session_id_roundtrip() {
        let sid = SessionId::new(42).unwrap();
        assert_eq!(sid.get(), 42);
        assert_eq!(format!("{}", sid), "42");
    }

    #[test]
    fn test_session_id_equality() {
        assert_eq!(SessionId::new(5), SessionId::new(5));
        assert_ne!(SessionId::new(5), SessionId::new(6));
    }

    #[test]
    fn test_session_id_serialization() {
        let sid = SessionId::new(9).unwrap();
        let json = serde_json::to_string(&sid).unwrap();
        let restored: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, restored);
    }

    // ========================================
    // LockId / TransactionId Tests
    // ========================================

    #[test]
    fn test_lock_id_roundtrip() {
        let id = LockId::new(7);
        assert_eq!(id.get(), 7);
        assert_eq!(format!("{}", id), "7");
    }

    #[test]
    fn test_transaction_id_initial_and_next() {
        assert_eq!(TransactionId::INITIAL.get(), 0);
        assert_eq!(TransactionId::INITIAL.next(), TransactionId::new(1));
        assert_eq!(TransactionId::new(41).next().get(), 42);
    }

    #[test]
    fn test_transaction_id_default_is_initial() {
        assert_eq!(TransactionId::default(), TransactionId::INITIAL);
    }

    #[test]
    fn test_transaction_id_ordering() {
        assert!(TransactionId::new(1) < TransactionId::new(2));
    }

    // ========================================
    // LoadError Tests
    // ========================================

    #[test]
    fn test_load_error_new() {
        let err = LoadError::new("/interfaces/interface[1]", "unknown leaf");
        assert_eq!(err.path, "/interfaces/interface[1]");
        assert_eq!(err.message, "unknown leaf");
    }
}
