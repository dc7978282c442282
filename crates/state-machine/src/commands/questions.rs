//! Questions are embedded in their form, so every edit recomputes the whole
//! question list and goes through [`SyncCommands::update_form_for_event`].

use evently_app_primitives::{EventId, Form, FormId, FormUpdate, NewQuestion, QuestionId, QuestionUpdate};
use evently_document_store::DocumentStore;

use super::SyncCommands;
use crate::error::SyncResult;

impl<S> SyncCommands<S>
where
    S: DocumentStore + ?Sized + 'static,
{
    pub async fn add_question_to_form(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        question: NewQuestion,
    ) -> SyncResult<Form> {
        self.session()?;
        let (_, form) = self.cached_form(event_id, form_id)?;
        let questions = form.questions_with_added(question)?;
        self.update_form_for_event(event_id, form_id, [FormUpdate::Questions(questions)])
            .await
    }

    pub async fn update_question_in_form(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        question_id: &QuestionId,
        updates: impl IntoIterator<Item = QuestionUpdate>,
    ) -> SyncResult<Form> {
        self.session()?;
        let (_, form) = self.cached_form(event_id, form_id)?;
        let questions = form.questions_with_updated(question_id, updates)?;
        self.update_form_for_event(event_id, form_id, [FormUpdate::Questions(questions)])
            .await
    }

    pub async fn delete_question_from_form(
        &self,
        event_id: &EventId,
        form_id: &FormId,
        question_id: &QuestionId,
    ) -> SyncResult<Form> {
        self.session()?;
        let (_, form) = self.cached_form(event_id, form_id)?;
        let questions = form.questions_without(question_id)?;
        self.update_form_for_event(event_id, form_id, [FormUpdate::Questions(questions)])
            .await
    }
}
