use anyhow::{Context, Result};
use evently_app_primitives::{Answer, Event, Form, NewEvent, NewQuestion, QuestionType};
use evently_document_store::{DocumentStore, DocumentValue, InMemoryDocumentStore};
use evently_state_machine::documents::{
    EVENT_COUNT, FORM_COUNT, flat_event, flat_forms, flat_responses, owner_events, owner_forms,
    owner_responses, user_doc,
};
use evently_state_machine::{ErrorKind, NotificationLevel, SyncCommands, SyncError};
use pretty_assertions::assert_eq;

use crate::infra::TestInfrastructure;

/// A form with one question and `responses` submitted answers
async fn form_with_responses(
    commands: &SyncCommands<InMemoryDocumentStore>,
    event: &Event,
    title: &str,
    responses: usize,
) -> Result<Form> {
    let form = commands.create_form_for_event(&event.id, title, "").await?;
    let form = commands
        .add_question_to_form(
            &event.id,
            &form.id,
            NewQuestion::new(QuestionType::ShortText, "Name"),
        )
        .await?;
    let question = form.questions[0].id.clone();
    for i in 0..responses {
        commands
            .submit_response(
                &event.id,
                &form.id,
                vec![Answer::text(question.clone(), format!("guest {i}"))],
            )
            .await?;
    }
    Ok(form)
}

#[tokio::test]
async fn test_delete_form_with_three_responses() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let alice = infra.sign_in("alice").await?.identity.clone().context("alice")?;
    let commands = infra.engine.commands();

    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    let doomed = form_with_responses(commands, &event, "RSVP", 3).await?;
    let kept = form_with_responses(commands, &event, "Feedback", 1).await?;

    let report = commands.delete_form_for_event(&event.id, &doomed.id).await?;
    assert_eq!(report.forms_deleted, 1);
    assert_eq!(report.responses_deleted, 3);

    assert_eq!(infra.count_in(&owner_responses(&alice, &event.id, &doomed.id)).await, 0);
    assert_eq!(infra.count_in(&flat_responses()).await, 1);
    assert_eq!(infra.count_in(&owner_forms(&alice, &event.id)).await, 1);
    assert_eq!(infra.count_in(&flat_forms()).await, 1);

    let flat = infra
        .remote
        .get(&flat_event(&event.id))
        .await?
        .context("flattened event")?;
    assert_eq!(flat.field(FORM_COUNT).and_then(DocumentValue::as_i64), Some(1));

    let state = infra.engine.snapshot();
    assert_eq!(state.current_event_forms.len(), 1);
    assert_eq!(state.current_event_forms[0].id, kept.id);
    assert!(!state.current_event_form_responses.contains_key(&doomed.id));
    assert_eq!(state.current_event.as_ref().map(|e| e.form_count), Some(1));

    infra.cleanup().await
}

#[tokio::test]
async fn test_delete_event_removes_whole_subtree() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let alice = infra.sign_in("alice").await?.identity.clone().context("alice")?;
    let commands = infra.engine.commands();

    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    let other = commands.create_event(NewEvent::new("Hackathon")).await?;
    form_with_responses(commands, &event, "RSVP", 2).await?;
    form_with_responses(commands, &event, "Feedback", 2).await?;
    form_with_responses(commands, &other, "Teams", 1).await?;

    let report = commands.delete_event(&event.id).await?;
    assert_eq!(report.forms_deleted, 2);
    assert_eq!(report.responses_deleted, 4);
    assert!(report.event_deleted);

    assert!(infra.remote.get(&flat_event(&event.id)).await?.is_none());
    assert_eq!(infra.count_in(&owner_forms(&alice, &event.id)).await, 0);
    assert_eq!(infra.count_in(&owner_events(&alice)).await, 1);
    assert_eq!(infra.count_in(&flat_forms()).await, 1);
    assert_eq!(infra.count_in(&flat_responses()).await, 1);
    let user = infra.remote.get(&user_doc(&alice)).await?.context("user")?;
    assert_eq!(user.field(EVENT_COUNT).and_then(DocumentValue::as_i64), Some(1));

    let state = infra.engine.snapshot();
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.events[0].id, other.id);
    assert!(state.current_event.as_ref().is_none_or(|e| e.id != event.id));

    infra.cleanup().await
}

#[tokio::test]
async fn test_partial_cascade_is_reported() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    infra.sign_in("alice").await?;
    let commands = infra.engine.commands();
    let mut notifications = infra.engine.subscribe_notifications();

    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    let form = form_with_responses(commands, &event, "RSVP", 3).await?;
    // Responses go, the form itself cannot
    infra.remote.fail_writes_under("forms/");

    let err = commands
        .delete_form_for_event(&event.id, &form.id)
        .await
        .expect_err("form delete must fail");
    match &err {
        SyncError::CascadeIncomplete { report, .. } => {
            assert_eq!(report.responses_deleted, 3);
            assert_eq!(report.forms_deleted, 0);
        }
        other => anyhow::bail!("unexpected error: {other}"),
    }

    let state = infra.engine.snapshot();
    assert!(matches!(state.error, Some(ErrorKind::CascadeIncomplete(_))));
    assert!(!state.is_loading);
    assert_eq!(state.current_event_forms.len(), 1, "form stays cached");

    let mut saw_error = false;
    while let Ok(notification) = notifications.try_recv() {
        saw_error |= notification.level == NotificationLevel::Error
            && notification.message.starts_with("Could not delete form");
    }
    assert!(saw_error);

    infra.cleanup().await
}
