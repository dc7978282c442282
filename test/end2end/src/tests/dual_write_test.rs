//! The two copies of a document are written one after the other with no
//! transaction around them.

use anyhow::{Context, Result};
use evently_app_primitives::{EventUpdate, NewEvent};
use evently_document_store::{DocumentStore, DocumentValue, StoreError};
use evently_state_machine::documents::{flat_event, owner_event, owner_events};
use evently_state_machine::{ErrorKind, NotificationLevel, SyncError};
use pretty_assertions::assert_eq;

use crate::infra::TestInfrastructure;

#[tokio::test]
async fn test_failed_flattened_write_is_surfaced() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let alice = infra.sign_in("alice").await?.identity.clone().context("alice")?;
    let commands = infra.engine.commands();
    let mut notifications = infra.engine.subscribe_notifications();

    infra.remote.fail_writes_under("events/");
    let err = commands
        .create_event(NewEvent::new("Career Fair"))
        .await
        .expect_err("flattened write must fail");
    assert!(matches!(
        err,
        SyncError::RemoteWrite(StoreError::PermissionDenied(_))
    ));

    let state = infra.engine.snapshot();
    assert!(state.events.is_empty(), "failed create never reaches the cache");
    assert!(matches!(state.error, Some(ErrorKind::RemoteWrite(_))));
    assert!(!state.is_loading);

    let notification = notifications.recv().await?;
    assert_eq!(notification.level, NotificationLevel::Error);

    // The canonical copy stays behind and is what the next load sees
    infra.remote.clear_failures();
    let events = commands.fetch_events().await?;
    assert_eq!(events.len(), 1);
    assert!(infra.remote.get(&flat_event(&events[0].id)).await?.is_none());
    assert_eq!(infra.count_in(&owner_events(&alice)).await, 1);
    assert!(infra.engine.snapshot().error.is_none());

    infra.cleanup().await
}

#[tokio::test]
async fn test_update_writes_both_copies() -> Result<()> {
    let infra = TestInfrastructure::setup().await?;
    let alice = infra.sign_in("alice").await?.identity.clone().context("alice")?;
    let commands = infra.engine.commands();

    let event = commands.create_event(NewEvent::new("Career Fair")).await?;
    commands
        .update_event(&event.id, [EventUpdate::Description("Hall B".to_string())])
        .await?;

    for path in [owner_event(&alice, &event.id), flat_event(&event.id)] {
        let document = infra.remote.get(&path).await?.context("copy missing")?;
        assert_eq!(
            document.field("description").and_then(DocumentValue::as_str),
            Some("Hall B"),
            "{path}"
        );
        assert_eq!(
            document.field("title").and_then(DocumentValue::as_str),
            Some("Career Fair")
        );
    }

    infra.cleanup().await
}
