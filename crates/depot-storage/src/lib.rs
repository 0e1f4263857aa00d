//! Depot Storage Library
//!
//! This crate defines the contract the pipeline needs from a content store
//! and ships two backends: an in-memory store for tests and tooling, and a
//! local filesystem store. It also provides the append-only fixity log.
//!
//! # Local layout
//!
//! - `objects/{object_id}/object.json` holds the object record
//! - `objects/{object_id}/versions/{sequence}.bin` and `.json` hold each version
//! - `objects/{object_id}/derivatives/{name}` holds generated derivatives
//! - `fixity/{object_id}.jsonl` holds the audit log
//!
//! Object ids and derivative names must not contain path separators or `..`.

pub mod audit;
pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use audit::{FixityLogStore, LocalFixityLog, MemoryFixityLog};
pub use depot_core::StorageBackend;
pub use factory::{create_content_store, create_fixity_log};
pub use local::LocalContentStore;
pub use memory::MemoryContentStore;
pub use traits::{ContentStore, StoreError, StoreResult};
