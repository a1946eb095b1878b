//! Core types for the confstore configuration datastore broker
//!
//! This crate defines the foundational types used throughout the system:
//! - DatastoreId / DatastoreState: the closed datastore set and its state
//!   machine vocabulary
//! - SessionId / LockId / TransactionId: typed identifiers
//! - Error: the broker's error taxonomy
//! - Limits: value-tree size limits fixed at registry construction
//! - ValueNode: the reduced configuration value tree the broker operates on

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::{report_invariant, Error, Result};
pub use limits::Limits;
pub use types::{
    DatastoreId, DatastoreState, LoadError, LockId, LockSource, SessionId, TransactionId,
};
pub use value::{ValueNode, CONFIG_ROOT_NAME};
