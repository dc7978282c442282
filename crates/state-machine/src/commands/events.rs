use evently_app_primitives::{
    Event, EventId, EventUpdate, NewEvent, ValidationError, now_millis,
};
use evently_document_store::{Direction, DocumentStore, Query};

use super::SyncCommands;
use crate::cascade::{CascadeDelete, CascadeReport};
use crate::documents::{
    CREATED_AT, EVENT_COUNT, WriteMode, decode, decode_all, event_fields, flat_event,
    owner_event, owner_events, owner_forms, user_doc,
};
use crate::error::SyncResult;
use crate::selectors;
use crate::state::Action;

impl<S> SyncCommands<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    /// Create an event owned by the active identity
    pub async fn create_event(&self, content: NewEvent) -> SyncResult<Event> {
        let session = self.session()?;
        if content.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title").into());
        }
        let event = Event::create(
            EventId::generate(),
            session.identity().clone(),
            content,
            now_millis(),
        );

        self.run(&session, "create_event", async {
            self.dual_set(
                owner_event(session.identity(), &event.id),
                flat_event(&event.id),
                event_fields(&event, WriteMode::Create),
            )
            .await?;
            self.bump(&user_doc(session.identity()), EVENT_COUNT, 1).await;
            tracing::info!(event_id = %event.id, "Event created");
            self.store
                .dispatch_for(&session, Action::EventAdded(event.clone()));
            self.notifier.info(format!("Event \"{}\" created", event.title));
            Ok(event.clone())
        })
        .await
    }

    /// Apply `updates` on top of the cached event and persist the result
    pub async fn update_event(
        &self,
        event_id: &EventId,
        updates: impl IntoIterator<Item = EventUpdate>,
    ) -> SyncResult<Event> {
        let session = self.session()?;
        let cached = selectors::event_by_id(&self.store.snapshot(), event_id)
            .cloned()
            .ok_or_else(|| ValidationError::NotLoaded {
                entity: "event",
                id: event_id.to_string(),
            })?;
        let mut event = cached.with_updates(updates);
        event.updated_at = now_millis();

        self.run(&session, "update_event", async {
            self.dual_update(
                owner_event(&event.creator_id, &event.id),
                flat_event(&event.id),
                event_fields(&event, WriteMode::Update),
            )
            .await?;
            self.store
                .dispatch_for(&session, Action::EventUpdated(event.clone()));
            Ok(event.clone())
        })
        .await
    }

    /// Delete an event with all its forms and responses
    pub async fn delete_event(&self, event_id: &EventId) -> SyncResult<CascadeReport> {
        let session = self.session()?;
        self.run(&session, "delete_event", async {
            let event = self.resolve_event(event_id).await?;
            let report = CascadeDelete::new(&*self.remote, self.config.effective_batch_size())
                .delete_event(&event)
                .await?;
            self.store
                .dispatch_for(&session, Action::EventDeleted(event_id.clone()));
            self.notifier.info(format!("Event \"{}\" deleted", event.title));
            Ok(report)
        })
        .await
    }

    /// Load the active identity's events, newest first
    pub async fn fetch_events(&self) -> SyncResult<Vec<Event>> {
        let session = self.session()?;
        self.run(&session, "fetch_events", async {
            let query = Query::new(owner_events(session.identity()))
                .order_by(CREATED_AT, Direction::Descending);
            let events: Vec<Event> = decode_all(&self.remote.query(&query).await?)?;
            tracing::debug!(count = events.len(), "Events fetched");
            self.store
                .dispatch_for(&session, Action::EventsLoaded(events.clone()));
            Ok(events)
        })
        .await
    }

    /// Load a single event by id and make it the current event
    pub async fn fetch_event(&self, event_id: &EventId) -> SyncResult<Event> {
        let session = self.session()?;
        self.run(&session, "fetch_event", async {
            let path = flat_event(event_id);
            let document = self.remote.get(&path).await?.ok_or_else(|| {
                evently_document_store::StoreError::NotFound(path.to_string())
            })?;
            let event: Event = decode(&document)?;
            let query = Query::new(owner_forms(&event.creator_id, &event.id))
                .order_by(CREATED_AT, Direction::Ascending);
            let forms = decode_all(&self.remote.query(&query).await?)?;
            self.store.dispatch_for(
                &session,
                Action::CurrentEventSet {
                    event: Some(event.clone()),
                    forms,
                },
            );
            Ok(event)
        })
        .await
    }
}
