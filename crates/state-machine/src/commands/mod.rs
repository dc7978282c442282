//! Remote sync commands
//!
//! Every mutating command follows the same path: check preconditions against
//! the cache, assemble the payload from the latest cached copy, sanitize it,
//! write the canonical copy and then the flattened copy, and finally dispatch
//! the outcome into the [`EntityStore`]. The two writes are sequential and not
//! transactional: if the flattened write fails the canonical copy stays
//! written and the command reports an error.
//!
//! Remote failures never reach the reducer as errors. They are recorded as
//! [`Action::ErrorSet`], published as a [`Notification`](crate::Notification)
//! and returned to the caller. `is_loading` is reset on every exit path.

mod events;
mod forms;
mod questions;
mod responses;

use evently_app_primitives::{Event, EventId, IdentityId, ValidationError};
use evently_document_store::{DocumentMap, DocumentPath, DocumentStore};
use std::future::Future;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::documents::{decode, flat_event};
use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::notifications::Notifier;
use crate::sanitize::sanitize_fields;
use crate::selectors;
use crate::state::Action;
use crate::store::{EntityStore, Session};

pub struct SyncCommands<S: ?Sized> {
    remote: Arc<S>,
    store: EntityStore,
    notifier: Notifier,
    config: Arc<EngineConfig>,
}

impl<S: ?Sized> Clone for SyncCommands<S> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> SyncCommands<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    pub fn new(remote: Arc<S>, store: EntityStore, config: EngineConfig) -> Self {
        let notifier = Notifier::new(config.notification_capacity);
        Self {
            remote,
            store,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Move the cache to `identity`, then load its events
    ///
    /// This is what the identity watcher calls on every provider change. A
    /// change to another identity clears the previous session's entities
    /// before anything of the new one is fetched.
    pub async fn switch_identity(&self, identity: Option<IdentityId>) {
        match &identity {
            Some(id) => tracing::info!(identity = %id, "Session active"),
            None => tracing::info!("Session ended"),
        }
        self.store.dispatch(Action::IdentityChanged(identity.clone()));
        if identity.is_some()
            && let Err(e) = self.fetch_events().await
        {
            tracing::warn!(error = %e, "Initial events fetch failed");
        }
    }

    pub fn clear_error(&self) {
        self.store.dispatch(Action::ErrorSet(None));
    }

    /// The active session, or a validation error when signed out
    fn session(&self) -> SyncResult<Session> {
        self.store
            .session()
            .ok_or(SyncError::Validation(ValidationError::MissingField("identityId")))
    }

    /// Run a remote operation with loading and error bookkeeping
    async fn run<T, F>(&self, session: &Session, operation: &'static str, work: F) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>>,
    {
        tracing::debug!(operation, "Remote sync started");
        self.store.dispatch_for(session, Action::ErrorSet(None));
        self.store.dispatch_for(session, Action::LoadingToggled(true));
        let result = work.await;
        if let Err(err) = &result {
            self.report(session, operation, err);
        }
        self.store.dispatch_for(session, Action::LoadingToggled(false));
        result
    }

    fn report(&self, session: &Session, operation: &'static str, err: &SyncError) {
        tracing::error!(operation, error = %err, "Remote sync failed");
        self.store
            .dispatch_for(session, Action::ErrorSet(Some(ErrorKind::from(err))));
        self.notifier
            .error(format!("Could not {}: {err}", operation.replace('_', " ")));
    }

    /// Event from the cache, otherwise from its flattened copy
    async fn resolve_event(&self, id: &EventId) -> SyncResult<Event> {
        if let Some(event) = selectors::event_by_id(&self.store.snapshot(), id) {
            return Ok(event.clone());
        }
        let path = flat_event(id);
        match self.remote.get(&path).await? {
            Some(document) => decode(&document),
            None => Err(evently_document_store::StoreError::NotFound(path.to_string()).into()),
        }
    }

    /// Create both copies of a new document
    async fn dual_set(
        &self,
        canonical: DocumentPath,
        flattened: DocumentPath,
        fields: DocumentMap,
    ) -> SyncResult<()> {
        let fields = sanitize_fields(fields);
        self.remote.set(&canonical, fields.clone()).await?;
        if let Err(e) = self.remote.set(&flattened, fields).await {
            tracing::warn!(
                canonical = %canonical,
                flattened = %flattened,
                error = %e,
                "Flattened copy not written, copies now diverge"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Merge fields into both copies of an existing document
    async fn dual_update(
        &self,
        canonical: DocumentPath,
        flattened: DocumentPath,
        fields: DocumentMap,
    ) -> SyncResult<()> {
        let fields = sanitize_fields(fields);
        self.remote.update(&canonical, fields.clone()).await?;
        if let Err(e) = self.remote.update(&flattened, fields).await {
            tracing::warn!(
                canonical = %canonical,
                flattened = %flattened,
                error = %e,
                "Flattened copy not updated, copies now diverge"
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Adjust a counter; a failure only makes the counter drift
    async fn bump(&self, path: &DocumentPath, field: &str, delta: i64) {
        if let Err(e) = self.remote.increment(path, field, delta).await {
            tracing::warn!(path = %path, field, delta, error = %e, "Counter not adjusted, it will drift");
        }
    }
}
