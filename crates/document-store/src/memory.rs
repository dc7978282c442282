//! In-process document store used for tests and offline development
//!
//! Mirrors the behaviour the engine relies on from the hosted store: it
//! rejects `Unset` values, resolves server timestamps, applies batches
//! atomically and enforces the batch ceiling. Writes under a configured path
//! prefix can be made to fail to exercise partial-failure paths.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::path::{CollectionPath, DocumentPath};
use crate::query::{Direction, MAX_BATCH_OPERATIONS, Query, WriteBatch, WriteOp};
use crate::storage::DocumentStore;
use crate::value::{Document, DocumentMap, DocumentValue};

type Documents = BTreeMap<DocumentPath, DocumentMap>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Documents>>,
    failing_prefixes: Arc<Mutex<Vec<String>>>,
    last_timestamp: Arc<AtomicU64>,
    write_calls: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write touching a path that starts with `prefix` fail
    pub fn fail_writes_under(&self, prefix: impl Into<String>) {
        self.failing_prefixes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prefix.into());
    }

    pub fn clear_failures(&self) {
        self.failing_prefixes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Number of write calls issued against this store, failed ones included
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Every document directly inside `collection`
    pub async fn documents_in(&self, collection: &CollectionPath) -> Vec<Document> {
        self.documents
            .read()
            .await
            .iter()
            .filter(|(path, _)| path.parent() == collection)
            .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
            .collect()
    }

    fn record_write(&self) {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self, path: &DocumentPath) -> Result<()> {
        let path = path.to_string();
        let failing = self
            .failing_prefixes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if failing.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return Err(StoreError::PermissionDenied(path));
        }
        Ok(())
    }

    /// Strictly increasing so ordering by timestamp is stable
    fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut current = self.last_timestamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(current + 1);
            match self.last_timestamp.compare_exchange(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    fn prepare(&self, path: &DocumentPath, fields: DocumentMap) -> Result<DocumentMap> {
        self.check_writable(path)?;
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.contains_unset()) {
            return Err(StoreError::InvalidArgument(format!(
                "unsupported field value: unset, found in field `{name}` of {path}"
            )));
        }
        let timestamp = self.next_timestamp();
        Ok(fields
            .into_iter()
            .map(|(k, v)| (k, resolve_timestamps(v, timestamp)))
            .collect())
    }

    fn apply(documents: &mut Documents, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::Set { path, fields } => {
                documents.insert(path, fields);
            }
            WriteOp::Update { path, fields } => {
                let existing = documents
                    .get_mut(&path)
                    .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
                existing.extend(fields);
            }
            WriteOp::Delete { path } => {
                documents.remove(&path);
            }
        }
        Ok(())
    }
}

fn resolve_timestamps(value: DocumentValue, timestamp: u64) -> DocumentValue {
    match value {
        DocumentValue::ServerTimestamp => DocumentValue::Timestamp(timestamp),
        DocumentValue::Array(items) => DocumentValue::Array(
            items
                .into_iter()
                .map(|v| resolve_timestamps(v, timestamp))
                .collect(),
        ),
        DocumentValue::Map(fields) => DocumentValue::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k, resolve_timestamps(v, timestamp)))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(path)
            .map(|fields| Document::new(path.clone(), fields.clone())))
    }

    async fn set(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()> {
        self.record_write();
        let fields = self.prepare(path, fields)?;
        let mut documents = self.documents.write().await;
        Self::apply(
            &mut documents,
            WriteOp::Set {
                path: path.clone(),
                fields,
            },
        )
    }

    async fn update(&self, path: &DocumentPath, fields: DocumentMap) -> Result<()> {
        self.record_write();
        let fields = self.prepare(path, fields)?;
        let mut documents = self.documents.write().await;
        Self::apply(
            &mut documents,
            WriteOp::Update {
                path: path.clone(),
                fields,
            },
        )
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        self.record_write();
        self.check_writable(path)?;
        let mut documents = self.documents.write().await;
        Self::apply(&mut documents, WriteOp::Delete { path: path.clone() })
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut results: Vec<Document> = documents
            .iter()
            .filter(|(path, fields)| path.parent() == &query.collection && query.matches(fields))
            .map(|(path, fields)| Document::new(path.clone(), fields.clone()))
            .collect();

        if let Some(order) = &query.order_by {
            results.sort_by(|a, b| {
                let left = a.field(&order.field).unwrap_or(&DocumentValue::Null);
                let right = b.field(&order.field).unwrap_or(&DocumentValue::Null);
                match order.direction {
                    Direction::Ascending => left.compare(right),
                    Direction::Descending => right.compare(left),
                }
            });
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn increment(&self, path: &DocumentPath, field: &str, delta: i64) -> Result<()> {
        self.record_write();
        self.check_writable(path)?;
        let mut documents = self.documents.write().await;
        let fields = documents.entry(path.clone()).or_default();
        let next = match fields.get(field) {
            None | Some(DocumentValue::Null) => DocumentValue::Integer(delta),
            Some(DocumentValue::Integer(current)) => DocumentValue::Integer(current + delta),
            Some(DocumentValue::Float(current)) => DocumentValue::Float(current + delta as f64),
            Some(other) => {
                return Err(StoreError::InvalidArgument(format!(
                    "cannot increment non-numeric field `{field}` of {path}: {other:?}"
                )));
            }
        };
        fields.insert(field.to_string(), next);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.record_write();
        if batch.len() > MAX_BATCH_OPERATIONS {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                max: MAX_BATCH_OPERATIONS,
            });
        }

        let mut prepared = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            prepared.push(match op {
                WriteOp::Set { path, fields } => {
                    let fields = self.prepare(&path, fields)?;
                    WriteOp::Set { path, fields }
                }
                WriteOp::Update { path, fields } => {
                    let fields = self.prepare(&path, fields)?;
                    WriteOp::Update { path, fields }
                }
                WriteOp::Delete { path } => {
                    self.check_writable(&path)?;
                    WriteOp::Delete { path }
                }
            });
        }

        let mut documents = self.documents.write().await;
        let mut working = documents.clone();
        for op in prepared {
            Self::apply(&mut working, op)?;
        }
        *documents = working;
        tracing::trace!(documents = documents.len(), "Committed write batch");
        Ok(())
    }
}
