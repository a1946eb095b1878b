//! confstore - configuration datastore lock broker for NETCONF-style agents
//!
//! confstore tracks the lifecycle and access state of the standard
//! configuration datastores (running, candidate, startup), arbitrates
//! exclusive ("global") and subtree-scoped ("partial") locks requested by
//! client sessions, and enforces the cascading side effects the protocol
//! mandates, such as discarding unconfirmed candidate edits when a lock on
//! the candidate is released.
//!
//! # Quick start
//!
//! ```
//! use confstore::{DatastoreId, DatastoreRegistry, DatastoreState, LockSource, SessionId};
//!
//! # fn main() -> confstore::Result<()> {
//! let mut registry = DatastoreRegistry::new();
//! for id in DatastoreId::ALL {
//!     registry.create_standard(id)?;
//! }
//! // ... load initial content ...
//! for id in DatastoreId::ALL {
//!     registry.set_state(id, DatastoreState::Ready);
//! }
//!
//! let session = SessionId::new(7).expect("nonzero session id");
//! registry.lock(DatastoreId::Running, session, LockSource::Netconf)?;
//! registry.unlock(DatastoreId::Running, session)?;
//!
//! // session termination releases everything the session still holds
//! registry.release_locks(Some(session));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The [`DatastoreRegistry`] owns the three standard [`Datastore`] entities
//! and is itself owned by the host application; there is no global state.
//! All operations are synchronous and rely on the caller serializing
//! requests (one RPC at a time). Value trees and partial-lock control blocks
//! are owned by the datastore they belong to.

// Re-export the public API of the member crates
pub use confstore_core::*;
pub use confstore_engine::*;
