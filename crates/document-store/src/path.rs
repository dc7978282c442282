//! Slash-separated document addresses (`users/u1/events/e1`)
//!
//! A collection path has an odd number of segments, a document path an even
//! number. Segments must not contain `/`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// A top-level collection
    pub fn root(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_string())
    }

    /// Address of document `id` inside this collection
    pub fn doc(&self, id: impl AsRef<str>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.as_ref().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    /// Parse a full document path, `None` if it does not name a document
    pub fn parse(path: &str) -> Option<Self> {
        let (collection, id) = path.rsplit_once('/')?;
        let segments = path.split('/').count();
        if segments % 2 != 0 || id.is_empty() || collection.is_empty() {
            return None;
        }
        Some(CollectionPath::root(collection).doc(id))
    }

    /// A subcollection nested under this document
    pub fn collection(&self, name: impl AsRef<str>) -> CollectionPath {
        CollectionPath(format!("{self}/{}", name.as_ref()))
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
