use evently_app_primitives::ValidationError;
use evently_document_store::StoreError;
use thiserror::Error;

use crate::cascade::CascadeReport;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A precondition failed before anything was written
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The remote store rejected a call; reads are reported the same way
    #[error("Remote write failed: {0}")]
    RemoteWrite(#[from] StoreError),

    /// A cascade failed after some of its deletes were already committed
    #[error(
        "Cascade delete incomplete ({} forms, {} responses removed): {source}",
        report.forms_deleted,
        report.responses_deleted
    )]
    CascadeIncomplete {
        report: CascadeReport,
        #[source]
        source: StoreError,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: StoreError,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Cloneable summary of a [`SyncError`] kept in the entity state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation(String),
    RemoteWrite(String),
    CascadeIncomplete(String),
}

impl ErrorKind {
    pub fn message(&self) -> &str {
        match self {
            ErrorKind::Validation(m) | ErrorKind::RemoteWrite(m) | ErrorKind::CascadeIncomplete(m) => m,
        }
    }
}

impl From<&SyncError> for ErrorKind {
    fn from(err: &SyncError) -> Self {
        match err {
            SyncError::Validation(_) => ErrorKind::Validation(err.to_string()),
            SyncError::RemoteWrite(_) | SyncError::Decode { .. } => {
                ErrorKind::RemoteWrite(err.to_string())
            }
            SyncError::CascadeIncomplete { .. } => ErrorKind::CascadeIncomplete(err.to_string()),
        }
    }
}
