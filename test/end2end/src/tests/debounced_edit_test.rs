use anyhow::{Context, Result};
use evently_app_primitives::{FormUpdate, NewEvent};
use evently_document_store::{DocumentStore, DocumentValue};
use evently_state_machine::EngineConfig;
use evently_state_machine::documents::{flat_event, flat_form};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::infra::TestInfrastructure;

fn config(window_ms: u64) -> EngineConfig {
    EngineConfig {
        debounce_window_ms: window_ms,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_persists_once() -> Result<()> {
    let infra = TestInfrastructure::setup_with_config(config(800)).await?;
    infra.sign_in("alice").await?;
    let event = infra
        .engine
        .commands()
        .create_event(NewEvent::new("C"))
        .await?;
    let writes = infra.remote.write_calls();

    let mut typed = String::from("C");
    for c in "areer Fair".chars() {
        typed.push(c);
        infra.engine.edit_event_details(&event.id, typed.clone(), "");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(infra.remote.write_calls(), writes, "nothing written while typing");

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(infra.remote.write_calls(), writes + 2);
    assert!(infra.engine.pending_edits().is_empty());

    let flat = infra
        .remote
        .get(&flat_event(&event.id))
        .await?
        .context("flattened event")?;
    assert_eq!(
        flat.field("title").and_then(DocumentValue::as_str),
        Some("Career Fair")
    );
    assert_eq!(infra.engine.snapshot().events[0].title, "Career Fair");

    infra.cleanup().await
}

#[tokio::test(start_paused = true)]
async fn test_form_and_event_edits_are_independent() -> Result<()> {
    let infra = TestInfrastructure::setup_with_config(config(500)).await?;
    infra.sign_in("alice").await?;
    let commands = infra.engine.commands();
    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    let form = commands.create_form_for_event(&event.id, "RSVP", "").await?;

    infra
        .engine
        .edit_form_details(&event.id, &form.id, "RSVP", "Doors open at 9");
    tokio::time::sleep(Duration::from_millis(300)).await;
    infra
        .engine
        .edit_event_details(&event.id, "Career Fair 2026", "");

    // Only the form's window has run out
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        infra.engine.pending_edits(),
        vec![format!("event:{}:details", event.id)]
    );
    let flat = infra
        .remote
        .get(&flat_form(&form.id))
        .await?
        .context("flattened form")?;
    assert_eq!(
        flat.field("description").and_then(DocumentValue::as_str),
        Some("Doors open at 9")
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(infra.engine.pending_edits().is_empty());
    assert_eq!(infra.engine.snapshot().events[0].title, "Career Fair 2026");

    infra.cleanup().await
}

#[tokio::test(start_paused = true)]
async fn test_retyping_an_earlier_title_after_a_direct_update() -> Result<()> {
    let infra = TestInfrastructure::setup_with_config(config(500)).await?;
    infra.sign_in("alice").await?;
    let commands = infra.engine.commands();
    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    let form = commands.create_form_for_event(&event.id, "RSVP", "").await?;

    infra.engine.edit_form_details(&event.id, &form.id, "Sign up", "");
    tokio::time::sleep(Duration::from_millis(600)).await;
    commands
        .update_form_for_event(&event.id, &form.id, [FormUpdate::Title("Register".to_string())])
        .await?;

    infra.engine.edit_form_details(&event.id, &form.id, "Sign up", "");
    tokio::time::sleep(Duration::from_millis(600)).await;

    let flat = infra
        .remote
        .get(&flat_form(&form.id))
        .await?
        .context("flattened form")?;
    assert_eq!(
        flat.field("title").and_then(DocumentValue::as_str),
        Some("Sign up")
    );
    assert_eq!(infra.engine.snapshot().current_event_forms[0].title, "Sign up");

    infra.cleanup().await
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_writes_what_is_pending() -> Result<()> {
    let infra = TestInfrastructure::setup_with_config(config(60_000)).await?;
    infra.sign_in("alice").await?;
    let event = infra
        .engine
        .commands()
        .create_event(NewEvent::new("Career Fair"))
        .await?;

    infra
        .engine
        .edit_event_details(&event.id, "Career Fair", "Bring your CV");
    let remote = infra.remote.clone();
    infra.cleanup().await?;

    let flat = remote
        .get(&flat_event(&event.id))
        .await?
        .context("flattened event")?;
    assert_eq!(
        flat.field("description").and_then(DocumentValue::as_str),
        Some("Bring your CV")
    );
    Ok(())
}
