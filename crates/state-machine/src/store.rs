use eyeball::{ObservableWriteGuard, SharedObservable, Subscriber};
use evently_app_primitives::IdentityId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::{Action, EntityState, reduce};

/// An identity together with the sign-in it was observed in
///
/// Signing out and back in as the same identity starts a new session, so
/// results of work begun before that are still told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: IdentityId,
    generation: u64,
}

impl Session {
    pub fn identity(&self) -> &IdentityId {
        &self.identity
    }
}

/// Observable holder of the current [`EntityState`]
///
/// Cloning gives another handle to the same cache. `dispatch` is the only
/// mutation path; subscribers are woken only when an action actually changed
/// something.
#[derive(Debug, Clone)]
pub struct EntityStore {
    state: SharedObservable<Arc<EntityState>>,
    // bumped under the state write lock on every identity change
    generation: Arc<AtomicU64>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            state: SharedObservable::new(Arc::new(EntityState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn snapshot(&self) -> Arc<EntityState> {
        self.state.get()
    }

    /// Stream of snapshots, starting after the current one
    pub fn subscribe(&self) -> Subscriber<Arc<EntityState>> {
        self.state.subscribe()
    }

    /// Session the cache currently belongs to
    pub fn identity(&self) -> Option<IdentityId> {
        self.state.read().identity.clone()
    }

    /// The active session, `None` when signed out
    pub fn session(&self) -> Option<Session> {
        let state = self.state.read();
        let identity = state.identity.clone()?;
        Some(Session {
            identity,
            generation: self.generation.load(Ordering::SeqCst),
        })
    }

    /// Apply `action`, returning whether the state changed
    pub fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let identity_change = matches!(action, Action::IdentityChanged(_));
        let mut state = self.state.write();
        let next = reduce(&state, action);
        if Arc::ptr_eq(&next, &state) {
            tracing::trace!(action = name, "Action left state unchanged");
            return false;
        }
        if identity_change && next.identity != state.identity {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        ObservableWriteGuard::set(&mut state, next);
        tracing::trace!(action = name, "State updated");
        true
    }

    /// Apply `action` only if `session` is still the active session
    ///
    /// Results of remote calls that finish after a sign-out or a session
    /// switch are dropped here instead of leaking into the new session,
    /// even when the same identity has signed in again meanwhile.
    pub fn dispatch_for(&self, session: &Session, action: Action) -> bool {
        let name = action.name();
        let mut state = self.state.write();
        if state.identity.as_ref() != Some(&session.identity)
            || self.generation.load(Ordering::SeqCst) != session.generation
        {
            tracing::warn!(
                action = name,
                session = %session.identity,
                "Dropping result for a session that is no longer active"
            );
            return false;
        }
        let next = reduce(&state, action);
        if Arc::ptr_eq(&next, &state) {
            return false;
        }
        ObservableWriteGuard::set(&mut state, next);
        true
    }

    /// Wait for the first snapshot that satisfies `predicate`
    pub async fn wait_until<F>(&self, predicate: F) -> Arc<EntityState>
    where
        F: Fn(&EntityState) -> bool,
    {
        let mut subscriber = self.subscribe();
        let mut current = subscriber.next_now();
        while !predicate(&current) {
            match subscriber.next().await {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }
}
