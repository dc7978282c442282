//! # Evently Document Store
//!
//! The contract of the remote document store the sync engine persists to:
//! addressable documents grouped into collections, an equality + ordering
//! query, an atomic numeric increment and a grouped batch commit.
//!
//! [`InMemoryDocumentStore`] implements the contract in-process.

pub mod error;
pub mod memory;
pub mod path;
pub mod query;
pub mod storage;
pub mod value;

pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use path::{CollectionPath, DocumentPath};
pub use query::{
    Direction, FieldFilter, MAX_BATCH_OPERATIONS, OrderBy, Query, WriteBatch, WriteOp,
    delete_batches,
};
#[cfg(any(feature = "mock", test))]
pub use storage::MockDocumentStore;
pub use storage::DocumentStore;
pub use value::{Document, DocumentMap, DocumentValue};
