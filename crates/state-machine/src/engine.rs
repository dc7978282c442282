use async_broadcast::Receiver;
use eyeball::Subscriber;
use evently_app_primitives::{EventId, EventUpdate, FormId, FormUpdate};
use evently_document_store::DocumentStore;
use std::sync::Arc;

use crate::commands::SyncCommands;
use crate::config::EngineConfig;
use crate::identity::{IdentityProvider, IdentityWatcher};
use crate::notifications::Notification;
use crate::scheduler::Debouncer;
use crate::selectors;
use crate::state::EntityState;
use crate::store::EntityStore;

/// Latest text of a debounced details edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEdit {
    EventDetails {
        event_id: EventId,
        title: String,
        description: String,
    },
    FormDetails {
        event_id: EventId,
        form_id: FormId,
        title: String,
        description: String,
    },
}

impl PendingEdit {
    /// Debounce key; edits of the same entity coalesce
    pub fn key(&self) -> String {
        match self {
            PendingEdit::EventDetails { event_id, .. } => format!("event:{event_id}:details"),
            PendingEdit::FormDetails { form_id, .. } => format!("form:{form_id}:details"),
        }
    }
}

/// One session-scoped instance of the sync engine
///
/// Holds the entity cache, the commands that keep it in sync with the remote
/// store, the debouncer for free-text edits and, when an identity provider was
/// given, the watcher following it.
pub struct SyncEngine<S: ?Sized> {
    commands: SyncCommands<S>,
    edits: Debouncer<PendingEdit>,
    watcher: Option<IdentityWatcher>,
}

impl<S> SyncEngine<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    pub fn builder(remote: Arc<S>) -> SyncEngineBuilder<S> {
        SyncEngineBuilder::new(remote)
    }

    pub fn commands(&self) -> &SyncCommands<S> {
        &self.commands
    }

    pub fn store(&self) -> &EntityStore {
        self.commands.store()
    }

    pub fn snapshot(&self) -> Arc<EntityState> {
        self.store().snapshot()
    }

    pub fn subscribe(&self) -> Subscriber<Arc<EntityState>> {
        self.store().subscribe()
    }

    pub fn subscribe_notifications(&self) -> Receiver<Notification> {
        self.commands.notifier().subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        self.commands.config()
    }

    /// Queue an event title/description edit
    ///
    /// Only the last edit within the debounce window is written, and only if
    /// it differs from the cached event when the window closes.
    pub fn edit_event_details(
        &self,
        event_id: &EventId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        let edit = PendingEdit::EventDetails {
            event_id: event_id.clone(),
            title: title.into(),
            description: description.into(),
        };
        self.edits.schedule(edit.key(), edit);
    }

    /// Queue a form title/description edit
    pub fn edit_form_details(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) {
        let edit = PendingEdit::FormDetails {
            event_id: event_id.clone(),
            form_id: form_id.clone(),
            title: title.into(),
            description: description.into(),
        };
        self.edits.schedule(edit.key(), edit);
    }

    /// Keys of edits still waiting for their debounce window
    pub fn pending_edits(&self) -> Vec<String> {
        self.edits.pending_keys()
    }

    /// Write every pending edit now
    pub async fn flush_pending_edits(&self) -> usize {
        self.edits.flush_all().await
    }

    /// Drop a pending edit without writing it
    pub fn discard_edit(&self, key: &str) -> bool {
        self.edits.cancel(key)
    }

    /// Flush pending edits and stop following the identity provider
    pub async fn shutdown(mut self) {
        let flushed = self.flush_pending_edits().await;
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        tracing::info!(flushed, "Sync engine shut down");
    }
}

/// The cached counterpart of `edit`, which is what the remote holds
fn persisted_edit(state: &EntityState, edit: &PendingEdit) -> Option<PendingEdit> {
    match edit {
        PendingEdit::EventDetails { event_id, .. } => {
            selectors::event_by_id(state, event_id).map(|event| PendingEdit::EventDetails {
                event_id: event.id.clone(),
                title: event.title.clone(),
                description: event.description.clone(),
            })
        }
        PendingEdit::FormDetails { form_id, .. } => {
            selectors::form_by_id(state, form_id).map(|form| PendingEdit::FormDetails {
                event_id: form.event_id.clone(),
                form_id: form.id.clone(),
                title: form.title.clone(),
                description: form.description.clone(),
            })
        }
    }
}

async fn persist_edit<S>(commands: SyncCommands<S>, edit: PendingEdit) -> bool
where
    S: DocumentStore + ?Sized + 'static,
{
    let result = match edit {
        PendingEdit::EventDetails {
            event_id,
            title,
            description,
        } => commands
            .update_event(
                &event_id,
                [EventUpdate::Title(title), EventUpdate::Description(description)],
            )
            .await
            .map(|_| ()),
        PendingEdit::FormDetails {
            event_id,
            form_id,
            title,
            description,
        } => commands
            .update_form_for_event(
                &event_id,
                &form_id,
                [FormUpdate::Title(title), FormUpdate::Description(description)],
            )
            .await
            .map(|_| ()),
    };
    if let Err(e) = &result {
        tracing::debug!(error = %e, "Debounced edit not persisted");
    }
    result.is_ok()
}

/// Assembles a [`SyncEngine`]
pub struct SyncEngineBuilder<S: ?Sized> {
    remote: Arc<S>,
    config: EngineConfig,
    store: Option<EntityStore>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl<S> SyncEngineBuilder<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    pub fn new(remote: Arc<S>) -> Self {
        Self {
            remote,
            config: EngineConfig::default(),
            store: None,
            identity_provider: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing cache instead of starting from an empty one
    pub fn with_store(mut self, store: EntityStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Follow this provider; without one, sessions are switched through
    /// [`SyncCommands::switch_identity`]
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    /// Build the engine; must be called from within a tokio runtime when an
    /// identity provider is set
    pub fn build(self) -> SyncEngine<S> {
        let store = self.store.unwrap_or_default();
        let window = self.config.debounce_window();
        let commands = SyncCommands::new(self.remote, store, self.config);

        let edits = {
            let writer = commands.clone();
            let store = commands.store().clone();
            Debouncer::with_current(
                window,
                move |_key, edit: PendingEdit| persist_edit(writer.clone(), edit),
                move |edit: &PendingEdit| persisted_edit(&store.snapshot(), edit),
            )
        };
        let watcher = self
            .identity_provider
            .map(|provider| IdentityWatcher::spawn(provider.as_ref(), commands.clone()));

        tracing::debug!(
            debounce_ms = window.as_millis() as u64,
            watching = watcher.is_some(),
            "Sync engine built"
        );
        SyncEngine {
            commands,
            edits,
            watcher,
        }
    }
}
