//! Lock broker engine for the standard configuration datastores
//!
//! This crate implements the per-datastore state machine, the global and
//! partial lock admission policies, the session-termination cleanup cascade,
//! and the candidate synchronization operations that are coupled to lock
//! release.
//!
//! The engine performs no internal locking and no I/O; it is driven
//! synchronously by a request dispatcher that serializes calls into it. See
//! [`DatastoreRegistry`] for the ownership and ordering requirements.

#![warn(clippy::all)]

pub mod datastore;
pub mod plock;
pub mod registry;

pub use datastore::Datastore;
pub use plock::{LockIdAllocator, PartialLock};
pub use registry::DatastoreRegistry;
