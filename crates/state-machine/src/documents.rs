//! Where entities live in the remote store and how they are encoded
//!
//! Every entity has a canonical copy under its owner and a flattened copy in a
//! top-level collection used for cross-owner lookups:
//!
//! | entity   | canonical                                         | flattened         |
//! |----------|---------------------------------------------------|-------------------|
//! | event    | `users/{c}/events/{e}`                            | `events/{e}`      |
//! | form     | `users/{c}/events/{e}/forms/{f}`                  | `forms/{f}`       |
//! | response | `users/{c}/events/{e}/forms/{f}/responses/{r}`    | `responses/{r}`   |
//!
//! The creator document `users/{c}` only carries the `eventCount` counter.

use evently_app_primitives::{
    Answer, AnswerValue, Event, EventId, Form, FormId, IdentityId, Question, Response, ResponseId,
};
use evently_document_store::{
    CollectionPath, Document, DocumentMap, DocumentPath, DocumentValue,
};
use serde::de::DeserializeOwned;

use crate::error::{SyncError, SyncResult};

pub const USERS: &str = "users";
pub const EVENTS: &str = "events";
pub const FORMS: &str = "forms";
pub const RESPONSES: &str = "responses";

pub const EVENT_COUNT: &str = "eventCount";
pub const FORM_COUNT: &str = "formCount";
pub const RESPONSE_COUNT: &str = "responseCount";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const SUBMITTED_AT: &str = "submittedAt";
pub const EVENT_ID: &str = "eventId";
pub const FORM_ID: &str = "formId";

pub fn user_doc(creator: &IdentityId) -> DocumentPath {
    CollectionPath::root(USERS).doc(creator)
}

pub fn owner_events(creator: &IdentityId) -> CollectionPath {
    user_doc(creator).collection(EVENTS)
}

pub fn owner_event(creator: &IdentityId, event: &EventId) -> DocumentPath {
    owner_events(creator).doc(event)
}

pub fn flat_event(event: &EventId) -> DocumentPath {
    CollectionPath::root(EVENTS).doc(event)
}

pub fn owner_forms(creator: &IdentityId, event: &EventId) -> CollectionPath {
    owner_event(creator, event).collection(FORMS)
}

pub fn owner_form(creator: &IdentityId, event: &EventId, form: &FormId) -> DocumentPath {
    owner_forms(creator, event).doc(form)
}

pub fn flat_forms() -> CollectionPath {
    CollectionPath::root(FORMS)
}

pub fn flat_form(form: &FormId) -> DocumentPath {
    flat_forms().doc(form)
}

pub fn owner_responses(creator: &IdentityId, event: &EventId, form: &FormId) -> CollectionPath {
    owner_form(creator, event, form).collection(RESPONSES)
}

pub fn owner_response(
    creator: &IdentityId,
    event: &EventId,
    form: &FormId,
    response: &ResponseId,
) -> DocumentPath {
    owner_responses(creator, event, form).doc(response)
}

pub fn flat_responses() -> CollectionPath {
    CollectionPath::root(RESPONSES)
}

pub fn flat_response(response: &ResponseId) -> DocumentPath {
    flat_responses().doc(response)
}

/// Whether the payload is for a first write or a merge into an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Full document with zeroed counters and both timestamps
    Create,
    /// Editable fields only; counters and `createdAt` are left untouched
    Update,
}

fn stamp(fields: &mut DocumentMap, mode: WriteMode) {
    if mode == WriteMode::Create {
        fields.insert(CREATED_AT.to_string(), DocumentValue::ServerTimestamp);
    }
    fields.insert(UPDATED_AT.to_string(), DocumentValue::ServerTimestamp);
}

pub fn event_fields(event: &Event, mode: WriteMode) -> DocumentMap {
    let mut fields = DocumentMap::new();
    fields.insert("title".to_string(), event.title.clone().into());
    fields.insert("description".to_string(), event.description.clone().into());
    if mode == WriteMode::Create {
        fields.insert("id".to_string(), event.id.as_str().into());
        fields.insert("creatorId".to_string(), event.creator_id.as_str().into());
        fields.insert(FORM_COUNT.to_string(), DocumentValue::Integer(0));
        fields.insert(RESPONSE_COUNT.to_string(), DocumentValue::Integer(0));
    }
    stamp(&mut fields, mode);
    fields
}

pub fn form_fields(form: &Form, mode: WriteMode) -> DocumentMap {
    let mut fields = DocumentMap::new();
    fields.insert("title".to_string(), form.title.clone().into());
    fields.insert("description".to_string(), form.description.clone().into());
    fields.insert(
        "questions".to_string(),
        DocumentValue::Array(form.questions.iter().map(question_value).collect()),
    );
    if mode == WriteMode::Create {
        fields.insert("id".to_string(), form.id.as_str().into());
        fields.insert(EVENT_ID.to_string(), form.event_id.as_str().into());
        fields.insert(RESPONSE_COUNT.to_string(), DocumentValue::Integer(0));
    }
    stamp(&mut fields, mode);
    fields
}

/// Absent options and descriptions are written as `Unset`
pub fn question_value(question: &Question) -> DocumentValue {
    let mut fields = DocumentMap::new();
    fields.insert("id".to_string(), question.id.as_str().into());
    fields.insert("type".to_string(), question.question_type.as_str().into());
    fields.insert("title".to_string(), question.title.clone().into());
    fields.insert("required".to_string(), question.required.into());
    let options = question.options.as_ref().map(|options| {
        options
            .iter()
            .map(|option| {
                let mut fields = DocumentMap::new();
                fields.insert("id".to_string(), option.id.as_str().into());
                fields.insert("value".to_string(), option.value.clone().into());
                DocumentValue::Map(fields)
            })
            .collect::<Vec<_>>()
    });
    fields.insert("options".to_string(), options.into());
    fields.insert("description".to_string(), question.description.clone().into());
    DocumentValue::Map(fields)
}

fn answer_value(answer: &Answer) -> DocumentValue {
    let value = match &answer.value {
        AnswerValue::Text(text) => DocumentValue::from(text.clone()),
        AnswerValue::Choices(choices) => {
            DocumentValue::Array(choices.iter().cloned().map(DocumentValue::from).collect())
        }
    };
    let mut fields = DocumentMap::new();
    fields.insert("questionId".to_string(), answer.question_id.as_str().into());
    fields.insert("value".to_string(), value);
    DocumentValue::Map(fields)
}

pub fn response_fields(response: &Response) -> DocumentMap {
    let mut fields = DocumentMap::new();
    fields.insert("id".to_string(), response.id.as_str().into());
    fields.insert(FORM_ID.to_string(), response.form_id.as_str().into());
    fields.insert(EVENT_ID.to_string(), response.event_id.as_str().into());
    fields.insert(
        "answers".to_string(),
        DocumentValue::Array(response.answers.iter().map(answer_value).collect()),
    );
    fields.insert(SUBMITTED_AT.to_string(), DocumentValue::ServerTimestamp);
    fields
}

pub fn decode<T: DeserializeOwned>(document: &Document) -> SyncResult<T> {
    document.decode().map_err(|source| SyncError::Decode {
        path: document.path.to_string(),
        source,
    })
}

pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> SyncResult<Vec<T>> {
    documents.iter().map(decode).collect()
}
