use evently_app_primitives::{
    Event, EventId, Form, FormId, FormUpdate, ValidationError, now_millis,
};
use evently_document_store::{Direction, DocumentStore, Query};

use super::SyncCommands;
use crate::cascade::{CascadeDelete, CascadeReport};
use crate::documents::{
    CREATED_AT, FORM_COUNT, WriteMode, decode, decode_all, flat_event, flat_form, form_fields,
    owner_event, owner_form, owner_forms,
};
use crate::error::{SyncError, SyncResult};
use crate::selectors;
use crate::state::Action;
use crate::store::Session;

impl<S> SyncCommands<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    /// Create a form under `event_id`; a blank title gets the configured default
    ///
    /// The event becomes the current event first so the new form shows up in
    /// the cached form list.
    pub async fn create_form_for_event(
        &self,
        event_id: &EventId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> SyncResult<Form> {
        let session = self.session()?;
        let title = title.into();
        let description = description.into();

        self.run(&session, "create_form", async {
            let event = self.resolve_event(event_id).await?;
            if !self.store.snapshot().is_current_event(event_id) {
                self.load_forms(&session, &event).await?;
            }
            let form = Form::create(
                FormId::generate(),
                event.id.clone(),
                title,
                description,
                &self.config.default_form_title,
                now_millis(),
            );
            self.dual_set(
                owner_form(&event.creator_id, &event.id, &form.id),
                flat_form(&form.id),
                form_fields(&form, WriteMode::Create),
            )
            .await?;
            self.bump(&owner_event(&event.creator_id, &event.id), FORM_COUNT, 1)
                .await;
            self.bump(&flat_event(&event.id), FORM_COUNT, 1).await;
            tracing::info!(event_id = %event.id, form_id = %form.id, "Form created");
            self.store
                .dispatch_for(&session, Action::FormAdded(form.clone()));
            self.notifier.info(format!("Form \"{}\" created", form.title));
            Ok(form)
        })
        .await
    }

    /// Apply `updates` on top of the cached form and persist the result
    pub async fn update_form_for_event(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        updates: impl IntoIterator<Item = FormUpdate>,
    ) -> SyncResult<Form> {
        let session = self.session()?;
        let (event, cached) = self.cached_form(event_id, form_id)?;
        let mut form = cached.with_updates(updates);
        form.updated_at = now_millis();

        self.run(&session, "update_form", async {
            self.dual_update(
                owner_form(&event.creator_id, &event.id, &form.id),
                flat_form(&form.id),
                form_fields(&form, WriteMode::Update),
            )
            .await?;
            self.store
                .dispatch_for(&session, Action::FormUpdated(form.clone()));
            Ok(form.clone())
        })
        .await
    }

    /// Delete a form and all its responses
    pub async fn delete_form_for_event(
        &self,
        event_id: &EventId,
        form_id: &FormId,
    ) -> SyncResult<CascadeReport> {
        let session = self.session()?;
        let cached = self.cached_form_under(event_id, form_id)?;
        self.run(&session, "delete_form", async {
            let event = self.resolve_event(event_id).await?;
            if cached.is_none() {
                self.remote_form(&event, form_id).await?;
            }
            let report = CascadeDelete::new(&*self.remote, self.config.effective_batch_size())
                .delete_form(&event, form_id)
                .await?;
            self.store.dispatch_for(
                &session,
                Action::FormDeleted {
                    event_id: event_id.clone(),
                    form_id: form_id.clone(),
                },
            );
            self.notifier.info(format!(
                "Form deleted with {} responses",
                report.responses_deleted
            ));
            Ok(report)
        })
        .await
    }

    /// Load the forms of `event_id` and make it the current event
    pub async fn fetch_forms_for_event(&self, event_id: &EventId) -> SyncResult<Vec<Form>> {
        let session = self.session()?;
        self.run(&session, "fetch_forms", async {
            let event = self.resolve_event(event_id).await?;
            self.load_forms(&session, &event).await
        })
        .await
    }

    async fn load_forms(&self, session: &Session, event: &Event) -> SyncResult<Vec<Form>> {
        let query = Query::new(owner_forms(&event.creator_id, &event.id))
            .order_by(CREATED_AT, Direction::Ascending);
        let forms: Vec<Form> = decode_all(&self.remote.query(&query).await?)?;
        tracing::debug!(event_id = %event.id, count = forms.len(), "Forms fetched");
        self.store.dispatch_for(
            session,
            Action::CurrentEventSet {
                event: Some(event.clone()),
                forms: forms.clone(),
            },
        );
        Ok(forms)
    }

    /// The cached event and form, both required for a form edit
    pub(super) fn cached_form(
        &self,
        event_id: &EventId,
        form_id: &FormId,
    ) -> SyncResult<(Event, Form)> {
        let form = self.cached_form_under(event_id, form_id)?.ok_or_else(|| {
            ValidationError::NotLoaded {
                entity: "form",
                id: form_id.to_string(),
            }
        })?;
        let event = selectors::event_by_id(&self.store.snapshot(), event_id)
            .cloned()
            .ok_or_else(|| ValidationError::NotLoaded {
                entity: "event",
                id: event_id.to_string(),
            })?;
        Ok((event, form))
    }

    /// The cached form, if any; a cached form of another event is an error
    pub(super) fn cached_form_under(
        &self,
        event_id: &EventId,
        form_id: &FormId,
    ) -> SyncResult<Option<Form>> {
        let state = self.store.snapshot();
        match selectors::form_by_id(&state, form_id) {
            Some(form) if &form.event_id != event_id => Err(wrong_event(form_id, &form.event_id)),
            found => Ok(found.cloned()),
        }
    }

    /// Read a form that is not cached, canonical copy first
    ///
    /// Fails when neither copy exists or when the form sits under another
    /// event, so nothing gets written against a form that is not there.
    pub(super) async fn remote_form(&self, event: &Event, form_id: &FormId) -> SyncResult<Form> {
        let document = match self
            .remote
            .get(&owner_form(&event.creator_id, &event.id, form_id))
            .await?
        {
            Some(document) => Some(document),
            None => self.remote.get(&flat_form(form_id)).await?,
        };
        let Some(document) = document else {
            return Err(ValidationError::NotLoaded {
                entity: "form",
                id: form_id.to_string(),
            }
            .into());
        };
        let form: Form = decode(&document)?;
        if form.event_id != event.id {
            return Err(wrong_event(form_id, &form.event_id));
        }
        Ok(form)
    }
}

fn wrong_event(form_id: &FormId, owner: &EventId) -> SyncError {
    ValidationError::InvalidField {
        field: "eventId",
        message: format!("form {form_id} belongs to event {owner}"),
    }
    .into()
}
