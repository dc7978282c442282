//! Read-only accessors over an [`EntityState`] snapshot

use evently_app_primitives::{Event, EventId, Form, FormId, Question, QuestionId, Response};

use crate::state::EntityState;

/// Event from the cached list, falling back to the current event
pub fn event_by_id<'a>(state: &'a EntityState, id: &EventId) -> Option<&'a Event> {
    state
        .events
        .iter()
        .find(|e| &e.id == id)
        .or_else(|| state.current_event.as_ref().filter(|e| &e.id == id))
}

pub fn current_event_forms(state: &EntityState) -> &[Form] {
    &state.current_event_forms
}

/// Cached responses of a form, empty when none were fetched
pub fn form_responses<'a>(state: &'a EntityState, form_id: &FormId) -> &'a [Response] {
    state
        .current_event_form_responses
        .get(form_id)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn form_by_id<'a>(state: &'a EntityState, form_id: &FormId) -> Option<&'a Form> {
    state.current_event_forms.iter().find(|f| &f.id == form_id)
}

pub fn question_by_id<'a>(
    state: &'a EntityState,
    form_id: &FormId,
    question_id: &QuestionId,
) -> Option<&'a Question> {
    form_by_id(state, form_id)?.question(question_id)
}

pub fn event_forms_count(state: &EntityState, id: &EventId) -> Option<i64> {
    event_by_id(state, id).map(|e| e.form_count)
}
