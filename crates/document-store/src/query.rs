use crate::path::{CollectionPath, DocumentPath};
use crate::value::{DocumentMap, DocumentValue};

/// Upper bound on the number of writes a single batch may carry
pub const MAX_BATCH_OPERATIONS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: DocumentValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query over the direct children of one collection
///
/// # Example
///
/// ```rust
/// # use evently_document_store::{CollectionPath, Direction, Query};
/// let query = Query::new(CollectionPath::root("users").doc("u1").collection("events"))
///     .order_by("createdAt", Direction::Descending)
///     .limit(20);
/// assert_eq!(query.limit, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<DocumentValue>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `fields` satisfies every equality filter
    pub fn matches(&self, fields: &DocumentMap) -> bool {
        self.filters
            .iter()
            .all(|f| fields.get(&f.field) == Some(&f.value))
    }
}

/// A single write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocumentPath,
        fields: DocumentMap,
    },
    Update {
        path: DocumentPath,
        fields: DocumentMap,
    },
    Delete {
        path: DocumentPath,
    },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } | WriteOp::Delete { path } => {
                path
            }
        }
    }
}

/// Group of writes committed all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, fields: DocumentMap) -> &mut Self {
        self.ops.push(WriteOp::Set { path, fields });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: DocumentMap) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Split deletes of `paths` into batches of at most `chunk_size` writes
pub fn delete_batches(paths: Vec<DocumentPath>, chunk_size: usize) -> Vec<WriteBatch> {
    let chunk_size = chunk_size.clamp(1, MAX_BATCH_OPERATIONS);
    paths
        .chunks(chunk_size)
        .map(|chunk| {
            let mut batch = WriteBatch::new();
            for path in chunk {
                batch.delete(path.clone());
            }
            batch
        })
        .collect()
}
