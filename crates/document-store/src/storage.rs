use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::path::DocumentPath;
use crate::query::{Query, WriteBatch};
use crate::value::{Document, DocumentMap};

#[cfg(any(feature = "mock", test))]
use mockall::automock;

/// Trait defining the remote document store the sync engine talks to
///
/// Writes are last-write-wins; there is no version check and no transaction
/// spanning more than one call except [`DocumentStore::commit`].
#[cfg_attr(any(feature = "mock", test), automock())]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Create or overwrite a document
    async fn set(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()>;

    /// Merge fields into an existing document
    ///
    /// Fails with [`crate::StoreError::NotFound`] if the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()>;

    /// Delete a document; deleting a missing document is not an error
    async fn delete(&self, path: &DocumentPath) -> Result<()>;

    /// Equality + ordering query over one collection
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Atomically add `delta` to a numeric field, creating it if missing
    async fn increment(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()>;

    /// Apply all writes of the batch or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        (**self).get(path).await
    }

    async fn set(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()> {
        (**self).set(path, fields).await
    }

    async fn update(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()> {
        (**self).update(path, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        (**self).delete(path).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        (**self).query(query).await
    }

    async fn increment(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()> {
        (**self).increment(path, field, delta).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch).await
    }
}
