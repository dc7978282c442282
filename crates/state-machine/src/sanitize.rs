//! Normalization of payloads before they leave the process
//!
//! The remote store rejects the `Unset` marker but accepts an explicit null,
//! so every `Unset`, at any depth, is rewritten to `Null`. Server timestamp
//! placeholders are left for the store to resolve.

use evently_document_store::{DocumentMap, DocumentValue};

pub fn sanitize(value: DocumentValue) -> DocumentValue {
    match value {
        DocumentValue::Unset => DocumentValue::Null,
        DocumentValue::Array(items) => DocumentValue::Array(items.into_iter().map(sanitize).collect()),
        DocumentValue::Map(fields) => DocumentValue::Map(sanitize_fields(fields)),
        other => other,
    }
}

pub fn sanitize_fields(fields: DocumentMap) -> DocumentMap {
    fields.into_iter().map(|(k, v)| (k, sanitize(v))).collect()
}
