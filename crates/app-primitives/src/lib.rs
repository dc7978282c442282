//! # Evently App Primitives
//!
//! Common types shared by the Evently sync engine and its collaborators.
//! This crate holds the entity graph (events, forms, questions, responses),
//! their identifiers and the closed sets of field updates that can be
//! applied to them.

pub mod error;
pub mod event;
pub mod form;
pub mod identity;
pub mod response;

pub use error::*;
pub use event::*;
pub use form::*;
pub use identity::*;
pub use response::*;

/// Current wall clock time as Unix milliseconds
///
/// Used for locally synthesized timestamps that are shown before the remote
/// store round-trips its own.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
