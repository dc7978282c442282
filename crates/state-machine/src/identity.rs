//! Session tracking
//!
//! An [`IdentityProvider`] publishes the active session token; the
//! [`IdentityWatcher`] turns every change into an identity switch on the
//! engine's cache followed by the initial events fetch.

use eyeball::{SharedObservable, Subscriber};
use evently_app_primitives::IdentityId;
use evently_document_store::DocumentStore;
use tokio::task::JoinHandle;

use crate::commands::SyncCommands;

/// Source of the current authenticated session
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<IdentityId>;

    /// Observe session changes; `None` means signed out
    fn subscribe(&self) -> Subscriber<Option<IdentityId>>;
}

/// In-process identity provider driven by explicit sign-in and sign-out calls
#[derive(Debug, Clone)]
pub struct LocalIdentityProvider {
    identity: SharedObservable<Option<IdentityId>>,
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self {
            identity: SharedObservable::new(None),
        }
    }

    pub fn sign_in(&self, identity: IdentityId) {
        tracing::debug!(identity = %identity, "Signing in");
        self.identity.set_if_not_eq(Some(identity));
    }

    pub fn sign_out(&self) {
        tracing::debug!("Signing out");
        self.identity.set_if_not_eq(None);
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current(&self) -> Option<IdentityId> {
        self.identity.get()
    }

    fn subscribe(&self) -> Subscriber<Option<IdentityId>> {
        self.identity.subscribe()
    }
}

/// Background task following an [`IdentityProvider`]
///
/// Changes are handled one at a time: the fetch for one session finishes
/// before the next change clears the cache. Dropping the watcher stops it.
#[derive(Debug)]
pub struct IdentityWatcher {
    handle: JoinHandle<()>,
}

impl IdentityWatcher {
    /// Start watching; must be called from within a tokio runtime
    pub fn spawn<S>(provider: &dyn IdentityProvider, commands: SyncCommands<S>) -> Self
    where
        S: DocumentStore + ?Sized + 'static,
    {
        let mut subscriber = provider.subscribe();
        let handle = tokio::spawn(async move {
            let initial = subscriber.next_now();
            commands.switch_identity(initial).await;
            while let Some(identity) = subscriber.next().await {
                commands.switch_identity(identity).await;
            }
            tracing::debug!("Identity provider gone, watcher stopped");
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop following the provider
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for IdentityWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::EntityStore;
    use evently_app_primitives::{Event, NewEvent};
    use evently_document_store::InMemoryDocumentStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn id(name: &str) -> IdentityId {
        IdentityId::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_watcher_follows_sign_in_and_out() {
        let remote = Arc::new(InMemoryDocumentStore::new());
        let store = EntityStore::new();
        let commands = SyncCommands::new(remote, store.clone(), EngineConfig::default());
        let provider = LocalIdentityProvider::new();
        let _watcher = IdentityWatcher::spawn(&provider, commands);

        provider.sign_in(id("alice"));
        let state = store
            .wait_until(|s| s.identity == Some(id("alice")) && !s.is_loading)
            .await;
        assert!(state.events.is_empty());

        provider.sign_out();
        let state = store.wait_until(|s| s.identity.is_none()).await;
        assert_eq!(*state, crate::state::EntityState::default());
    }

    #[tokio::test]
    async fn test_dropped_watcher_ignores_changes() {
        let remote = Arc::new(InMemoryDocumentStore::new());
        let store = EntityStore::new();
        let commands = SyncCommands::new(remote, store.clone(), EngineConfig::default());
        let provider = LocalIdentityProvider::new();
        let watcher = IdentityWatcher::spawn(&provider, commands);
        drop(watcher);

        provider.sign_in(id("alice"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.identity().is_none());
    }

    #[tokio::test]
    async fn test_switch_clears_previous_session_before_loading() {
        let remote = Arc::new(InMemoryDocumentStore::new());
        let store = EntityStore::new();
        let commands = SyncCommands::new(Arc::clone(&remote), store.clone(), EngineConfig::default());
        let provider = LocalIdentityProvider::new();
        let _watcher = IdentityWatcher::spawn(&provider, commands.clone());

        provider.sign_in(id("alice"));
        store
            .wait_until(|s| s.identity == Some(id("alice")) && !s.is_loading)
            .await;
        let alice_event = commands.create_event(NewEvent::new("Alice's fair")).await.unwrap();

        let mut updates = store.subscribe();
        provider.sign_in(id("bob"));
        let mut saw_empty_bob = false;
        while let Some(state) = updates.next().await {
            if state.identity == Some(id("bob")) {
                assert!(
                    !state.events.iter().any(|e: &Event| e.id == alice_event.id),
                    "alice's events leaked into bob's session"
                );
                saw_empty_bob |= state.events.is_empty();
                if !state.is_loading {
                    break;
                }
            }
        }
        assert!(saw_empty_bob);
    }
}
