//! Error types for the configuration datastore broker
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Protocol-meaningful failures are returned as `Result` values to the
//! immediate caller. Internal-invariant violations (caller bugs) are
//! additionally reported through [`report_invariant`], which asserts in debug
//! builds and degrades to an error log in release builds, so release builds
//! stay operational instead of crashing.

use crate::types::DatastoreState;
use thiserror::Error;

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the configuration datastore broker
#[derive(Debug, Error)]
pub enum Error {
    /// A lock is held incompatibly with the request: global vs. partial
    /// mutual exclusion, or a partial lock requested on a non-running
    /// datastore
    #[error("lock denied: an incompatible lock is active")]
    LockDenied,

    /// The datastore's current state admits neither locking nor, for some
    /// calls, reading or writing
    #[error("no access in datastore state '{0}'")]
    NoAccessState(DatastoreState),

    /// The requesting session does not own the active global lock
    #[error("global lock is held by another session")]
    NoAccessLock,

    /// A global lock on the candidate was requested while unconfirmed edits
    /// exist
    #[error("candidate datastore has unconfirmed edits")]
    CandidateDirty,

    /// A non-standard datastore lacking the target flag was used as a write
    /// target
    #[error("datastore is not a writable target")]
    NotWritable,

    /// A synchronization source has no content to clone from
    #[error("synchronization source has no content")]
    DataMissing,

    /// Lock information was requested while no global lock is active
    #[error("no global lock is active")]
    NotLocked,

    /// The partial-lock id space is exhausted
    #[error("partial lock id space exhausted")]
    ResourceDenied,

    /// A value-tree clone exceeded the configured nesting depth limit
    #[error("value tree too deep: {actual} levels exceeds maximum {max}")]
    TreeTooDeep {
        /// Depth reached when the limit tripped
        actual: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// A value-tree clone exceeded the configured node count limit
    #[error("value tree too large: {actual} nodes exceeds maximum {max}")]
    TreeTooLarge {
        /// Node count reached when the limit tripped
        actual: usize,
        /// Maximum allowed node count
        max: usize,
    },

    /// A programming-invariant violation that still returns a result so
    /// release builds remain operational
    #[error("internal value error: {0}")]
    InternalValue(&'static str),
}

/// Report a programming-invariant violation
///
/// Asserts in debug builds; always emits an error-level log. Callers still
/// return a normal [`Error`] (or degrade to a no-op) afterwards so release
/// builds keep running.
pub fn report_invariant(msg: &str) {
    tracing::error!(target: "confstore", "invariant violation: {msg}");
    debug_assert!(false, "invariant violation: {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_lock_denied() {
        let msg = Error::LockDenied.to_string();
        assert!(msg.contains("lock denied"));
    }

    #[test]
    fn test_error_display_no_access_state() {
        let msg = Error::NoAccessState(DatastoreState::Cleanup).to_string();
        assert!(msg.contains("cleanup"));
    }

    #[test]
    fn test_error_display_candidate_dirty() {
        let msg = Error::CandidateDirty.to_string();
        assert!(msg.contains("unconfirmed edits"));
    }

    #[test]
    fn test_error_display_tree_limits() {
        let msg = Error::TreeTooDeep { actual: 9, max: 8 }.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains('8'));

        let msg = Error::TreeTooLarge {
            actual: 17,
            max: 16,
        }
        .to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("16"));
    }

    #[test]
    fn test_result_type_alias() {
        fn denied() -> Result<()> {
            Err(Error::LockDenied)
        }
        assert!(matches!(denied(), Err(Error::LockDenied)));
    }
}
