//! Evently sync engine
//!
//! Keeps a local, observable cache of one creator's events, the forms attached
//! to the selected event and the responses submitted to those forms, and keeps
//! it consistent with a remote [`DocumentStore`](evently_document_store::DocumentStore).
//!
//! Every state change goes through [`reduce`]; remote writes go through
//! [`SyncCommands`]; free-text edits are coalesced by a [`Debouncer`] before
//! they reach the commands. [`SyncEngine`] wires all of it together and
//! follows an [`IdentityProvider`] so that a session switch never shows the
//! previous session's data.

pub mod cascade;
pub mod commands;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod identity;
pub mod notifications;
pub mod sanitize;
pub mod scheduler;
pub mod selectors;
pub mod state;
pub mod store;


pub use cascade::CascadeReport;
pub use commands::SyncCommands;
pub use config::EngineConfig;
pub use engine::{PendingEdit, SyncEngine, SyncEngineBuilder};
pub use error::{ErrorKind, SyncError, SyncResult};
pub use identity::{IdentityProvider, IdentityWatcher, LocalIdentityProvider};
pub use notifications::{Notification, NotificationLevel, Notifier};
pub use sanitize::{sanitize, sanitize_fields};
pub use scheduler::Debouncer;
pub use state::{Action, EntityState, reduce};
pub use store::{EntityStore, Session};

// Model types callers need alongside the engine
pub use evently_app_primitives as primitives;
