//! Field values of stored documents
//!
//! `Unset` is the absence-of-value marker, distinct from an explicit `Null`.
//! Stores reject it, so payloads have to be sanitized before a write.
//! `ServerTimestamp` is a placeholder the store replaces with its own clock
//! when the write is applied.

use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::path::DocumentPath;

pub type DocumentMap = BTreeMap<String, DocumentValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    /// No value at all
    Unset,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Unix milliseconds, as resolved by the store
    Timestamp(u64),
    /// Placeholder resolved by the store at write time
    ServerTimestamp,
    Array(Vec<DocumentValue>),
    Map(DocumentMap),
}

impl DocumentValue {
    /// Whether an `Unset` marker appears anywhere in this value
    pub fn contains_unset(&self) -> bool {
        match self {
            DocumentValue::Unset => true,
            DocumentValue::Array(items) => items.iter().any(DocumentValue::contains_unset),
            DocumentValue::Map(fields) => fields.values().any(DocumentValue::contains_unset),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocumentValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Lossy conversion for decoding; `Unset` and unresolved placeholders become null
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DocumentValue::Unset | DocumentValue::Null | DocumentValue::ServerTimestamp => {
                serde_json::Value::Null
            }
            DocumentValue::Bool(b) => serde_json::Value::Bool(*b),
            DocumentValue::Integer(i) => serde_json::Value::from(*i),
            DocumentValue::Float(f) => serde_json::Value::from(*f),
            DocumentValue::String(s) => serde_json::Value::String(s.clone()),
            DocumentValue::Timestamp(t) => serde_json::Value::from(*t),
            DocumentValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(DocumentValue::to_json).collect())
            }
            DocumentValue::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            DocumentValue::Unset | DocumentValue::Null => 0,
            DocumentValue::Bool(_) => 1,
            DocumentValue::Integer(_) | DocumentValue::Float(_) => 2,
            DocumentValue::Timestamp(_) | DocumentValue::ServerTimestamp => 3,
            DocumentValue::String(_) => 4,
            DocumentValue::Array(_) => 5,
            DocumentValue::Map(_) => 6,
        }
    }

    /// Total ordering used by ordered queries: by type first, then by value
    pub fn compare(&self, other: &Self) -> Ordering {
        use DocumentValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Array(a), Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.compare(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<serde_json::Value> for DocumentValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DocumentValue::Null,
            serde_json::Value::Bool(b) => DocumentValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => DocumentValue::Integer(i),
                None => DocumentValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => DocumentValue::String(s),
            serde_json::Value::Array(items) => {
                DocumentValue::Array(items.into_iter().map(DocumentValue::from).collect())
            }
            serde_json::Value::Object(fields) => DocumentValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, DocumentValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for DocumentValue {
    fn from(value: &str) -> Self {
        DocumentValue::String(value.to_string())
    }
}

impl From<String> for DocumentValue {
    fn from(value: String) -> Self {
        DocumentValue::String(value)
    }
}

impl From<bool> for DocumentValue {
    fn from(value: bool) -> Self {
        DocumentValue::Bool(value)
    }
}

impl From<i64> for DocumentValue {
    fn from(value: i64) -> Self {
        DocumentValue::Integer(value)
    }
}

impl<T: Into<DocumentValue>> From<Vec<T>> for DocumentValue {
    fn from(value: Vec<T>) -> Self {
        DocumentValue::Array(value.into_iter().map(Into::into).collect())
    }
}

/// `None` maps to the `Unset` marker, not to `Null`
impl<T: Into<DocumentValue>> From<Option<T>> for DocumentValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DocumentValue::Unset, Into::into)
    }
}

impl From<DocumentMap> for DocumentValue {
    fn from(value: DocumentMap) -> Self {
        DocumentValue::Map(value)
    }
}

/// A stored document together with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: DocumentMap,
}

impl Document {
    pub fn new(path: DocumentPath, fields: DocumentMap) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn field(&self, name: &str) -> Option<&DocumentValue> {
        self.fields.get(name)
    }

    /// Decode the document fields into a typed entity
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let json = DocumentValue::Map(self.fields.clone()).to_json();
        Ok(serde_json::from_value(json)?)
    }
}
