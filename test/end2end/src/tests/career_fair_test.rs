//! The whole lifecycle of one event: create it, build a form, collect a
//! response and read it back after a fresh sign-in.

use anyhow::{Context, Result};
use evently_app_primitives::{Answer, NewEvent, NewQuestion, QuestionOption, QuestionType};
use evently_document_store::{DocumentStore, DocumentValue};
use evently_state_machine::documents::{
    EVENT_COUNT, FORM_COUNT, RESPONSE_COUNT, flat_event, flat_form, flat_responses, owner_form,
    owner_responses, user_doc,
};
use evently_state_machine::selectors;
use pretty_assertions::assert_eq;
use tracing::info;

use crate::infra::TestInfrastructure;

async fn counter(
    infra: &TestInfrastructure,
    path: &evently_document_store::DocumentPath,
    field: &str,
) -> Result<Option<i64>> {
    let document = infra
        .remote
        .get(path)
        .await?
        .with_context(|| format!("{path} missing"))?;
    Ok(document.field(field).and_then(DocumentValue::as_i64))
}

#[tokio::test]
async fn test_career_fair_scenario() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let alice = infra.sign_in("alice").await?;
    let alice_id = alice.identity.clone().context("signed in")?;
    let commands = infra.engine.commands();

    let event = commands
        .create_event(NewEvent::new("Career Fair").with_description("Spring edition"))
        .await?;
    info!(event_id = %event.id, "📁 Event created");

    let form = commands
        .create_form_for_event(&event.id, "Registration", "")
        .await?;
    commands
        .add_question_to_form(
            &event.id,
            &form.id,
            NewQuestion::new(QuestionType::ShortText, "Full name").required(true),
        )
        .await?;
    let form = commands
        .add_question_to_form(
            &event.id,
            &form.id,
            NewQuestion::new(QuestionType::SingleChoice, "Track").with_options(vec![
                QuestionOption::new("Engineering"),
                QuestionOption::new("Design"),
            ]),
        )
        .await?;
    assert_eq!(form.questions.len(), 2);
    let (name, track) = (&form.questions[0], &form.questions[1]);

    assert_eq!(counter(&infra, &flat_form(&form.id), RESPONSE_COUNT).await?, Some(0));
    let response = commands
        .submit_response(
            &event.id,
            &form.id,
            vec![
                Answer::text(name.id.clone(), "Ada Lovelace"),
                Answer::choices(track.id.clone(), ["Engineering"]),
            ],
        )
        .await?;

    let responses = commands.fetch_responses(&event.id, &form.id).await?;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, response.id);
    assert_eq!(responses[0].answers, response.answers);

    let state = infra.engine.snapshot();
    assert_eq!(selectors::form_responses(&state, &form.id).len(), 1);
    assert_eq!(selectors::event_forms_count(&state, &event.id), Some(1));
    assert_eq!(state.current_event_forms[0].response_count, 1);

    // Both copies of every counter moved
    assert_eq!(counter(&infra, &user_doc(&alice_id), EVENT_COUNT).await?, Some(1));
    assert_eq!(counter(&infra, &flat_event(&event.id), FORM_COUNT).await?, Some(1));
    assert_eq!(counter(&infra, &flat_event(&event.id), RESPONSE_COUNT).await?, Some(1));
    assert_eq!(counter(&infra, &flat_form(&form.id), RESPONSE_COUNT).await?, Some(1));
    assert_eq!(
        counter(&infra, &owner_form(&alice_id, &event.id, &form.id), RESPONSE_COUNT).await?,
        Some(1)
    );
    assert_eq!(
        infra
            .count_in(&owner_responses(&alice_id, &event.id, &form.id))
            .await,
        1
    );
    assert_eq!(infra.count_in(&flat_responses()).await, 1);

    // A fresh session sees what was persisted
    infra.sign_out().await?;
    let state = infra.sign_in("alice").await?;
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.events[0].title, "Career Fair");
    assert_eq!(state.events[0].form_count, 1);
    assert_eq!(state.events[0].response_count, 1);

    let forms = commands.fetch_forms_for_event(&event.id).await?;
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].questions, form.questions);

    infra.cleanup().await
}

#[tokio::test]
async fn test_blank_form_title_gets_default() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    infra.sign_in("alice").await?;
    let commands = infra.engine.commands();

    let event = commands.create_event(NewEvent::new("Meetup")).await?;
    let form = commands.create_form_for_event(&event.id, "  ", "").await?;
    assert_eq!(form.title, "Untitled Form");

    infra.cleanup().await
}
