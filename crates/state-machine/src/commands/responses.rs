use evently_app_primitives::{
    Answer, EventId, FormId, Response, ResponseId, ValidationError, now_millis,
};
use evently_document_store::{Direction, DocumentStore, Query};

use super::SyncCommands;
use crate::documents::{
    RESPONSE_COUNT, SUBMITTED_AT, decode_all, flat_event, flat_form, flat_response, owner_event,
    owner_form, owner_response, owner_responses, response_fields,
};
use crate::error::SyncResult;
use crate::state::Action;

impl<S> SyncCommands<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    /// Append a response to a form and bump the form and event counters
    ///
    /// The form has to exist under `event_id`, in the cache or remotely.
    /// Answer question ids are only checked against the cached form when
    /// `validate_answers` is enabled.
    pub async fn submit_response(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        answers: Vec<Answer>,
    ) -> SyncResult<Response> {
        let session = self.session()?;
        let cached = self.cached_form_under(event_id, form_id)?;
        if self.config.validate_answers {
            let form = cached.as_ref().ok_or_else(|| ValidationError::NotLoaded {
                entity: "form",
                id: form_id.to_string(),
            })?;
            if let Some(answer) = answers.iter().find(|a| form.question(&a.question_id).is_none()) {
                return Err(ValidationError::QuestionNotFound(answer.question_id.to_string()).into());
            }
        }
        let response = Response {
            id: ResponseId::generate(),
            form_id: form_id.clone(),
            event_id: event_id.clone(),
            answers,
            submitted_at: now_millis(),
        };

        self.run(&session, "submit_response", async {
            let event = self.resolve_event(event_id).await?;
            if cached.is_none() {
                self.remote_form(&event, form_id).await?;
            }
            let creator = &event.creator_id;
            self.dual_set(
                owner_response(creator, event_id, form_id, &response.id),
                flat_response(&response.id),
                response_fields(&response),
            )
            .await?;
            self.bump(&owner_form(creator, event_id, form_id), RESPONSE_COUNT, 1)
                .await;
            self.bump(&flat_form(form_id), RESPONSE_COUNT, 1).await;
            self.bump(&owner_event(creator, event_id), RESPONSE_COUNT, 1)
                .await;
            self.bump(&flat_event(event_id), RESPONSE_COUNT, 1).await;
            tracing::debug!(form_id = %form_id, response_id = %response.id, "Response submitted");
            self.store
                .dispatch_for(&session, Action::ResponseAdded(response.clone()));
            self.notifier.info("Response submitted");
            Ok(response.clone())
        })
        .await
    }

    /// Load the responses of a form, oldest first
    pub async fn fetch_responses(
        &self,
        event_id: &EventId,
        form_id: &FormId,
    ) -> SyncResult<Vec<Response>> {
        let session = self.session()?;
        self.run(&session, "fetch_responses", async {
            let event = self.resolve_event(event_id).await?;
            let query = Query::new(owner_responses(&event.creator_id, event_id, form_id))
                .order_by(SUBMITTED_AT, Direction::Ascending);
            let responses: Vec<Response> = decode_all(&self.remote.query(&query).await?)?;
            self.store.dispatch_for(
                &session,
                Action::FormResponsesSet {
                    form_id: form_id.clone(),
                    responses: responses.clone(),
                },
            );
            Ok(responses)
        })
        .await
    }
}
