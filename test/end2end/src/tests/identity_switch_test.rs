use anyhow::Result;
use evently_app_primitives::{EventId, NewEvent};
use evently_state_machine::EntityState;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use crate::infra::TestInfrastructure;

fn titles(state: &EntityState) -> Vec<&str> {
    state.events.iter().map(|e| e.title.as_str()).collect()
}

#[tokio::test]
async fn test_switching_identity_never_mixes_sessions() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let commands = infra.engine.commands();

    infra.sign_in("alice").await?;
    let alice_event = commands.create_event(NewEvent::new("Alice's fair")).await?;
    commands
        .create_form_for_event(&alice_event.id, "RSVP", "")
        .await?;

    // Record every snapshot bob's session goes through
    let mut updates = infra.engine.subscribe();
    let recorder = tokio::spawn(async move {
        let mut seen: Vec<Arc<EntityState>> = Vec::new();
        while let Some(state) = updates.next().await {
            let done = state.identity.as_ref().is_some_and(|i| i.as_str() == "bob")
                && !state.is_loading;
            seen.push(state);
            if done {
                break;
            }
        }
        seen
    });

    let bob = infra.sign_in("bob").await?;
    assert!(bob.events.is_empty());
    assert!(bob.current_event.is_none());
    assert!(bob.current_event_forms.is_empty());

    let seen = recorder.await?;
    let leaked = |state: &Arc<EntityState>| {
        state.identity.as_ref().is_some_and(|i| i.as_str() == "bob")
            && (state.events.iter().any(|e| e.id == alice_event.id)
                || state.current_event.as_ref().is_some_and(|e| e.id == alice_event.id))
    };
    assert!(!seen.iter().any(leaked), "alice's data showed up in bob's session");

    commands.create_event(NewEvent::new("Bob's gala")).await?;
    assert_eq!(titles(&infra.engine.snapshot()), vec!["Bob's gala"]);

    let alice = infra.sign_in("alice").await?;
    assert_eq!(titles(&alice), vec!["Alice's fair"]);

    let signed_out = infra.sign_out().await?;
    assert_eq!(*signed_out, EntityState::default());

    infra.cleanup().await
}

#[tokio::test]
async fn test_commands_need_a_session() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let commands = infra.engine.commands();
    let writes = infra.remote.write_calls();

    assert!(commands.create_event(NewEvent::new("Nobody's fair")).await.is_err());
    assert!(commands.fetch_events().await.is_err());
    assert!(
        commands
            .delete_event(&EventId::new("missing")?)
            .await
            .is_err()
    );
    assert_eq!(infra.remote.write_calls(), writes);
    assert_eq!(*infra.engine.snapshot(), EntityState::default());

    infra.cleanup().await
}
