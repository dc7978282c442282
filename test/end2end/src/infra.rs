use anyhow::{Context, Result};
use evently_app_primitives::IdentityId;
use evently_document_store::{CollectionPath, InMemoryDocumentStore};
use evently_state_machine::{EngineConfig, EntityState, LocalIdentityProvider, SyncEngine};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

static TRACING: Once = Once::new();

/// How long a scenario waits for the cache to reach an expected state
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine plus the store and identity provider it talks to
pub struct TestInfrastructure {
    pub remote: Arc<InMemoryDocumentStore>,
    pub identities: Arc<LocalIdentityProvider>,
    pub engine: SyncEngine<InMemoryDocumentStore>,
}

impl TestInfrastructure {
    /// Fresh store, nobody signed in
    pub async fn setup() -> Result<Self> {
        Self::setup_with_config(EngineConfig::default()).await
    }

    pub async fn setup_with_config(config: EngineConfig) -> Result<Self> {
        init_tracing();
        let remote = Arc::new(InMemoryDocumentStore::new());
        let identities = Arc::new(LocalIdentityProvider::new());
        let engine = SyncEngine::builder(Arc::clone(&remote))
            .with_config(config)
            .with_identity_provider(identities.clone())
            .build();
        info!("🚀 Test engine ready");
        Ok(Self {
            remote,
            identities,
            engine,
        })
    }

    /// Sign `name` in and wait for its events to load
    pub async fn sign_in(&self, name: &str) -> Result<Arc<EntityState>> {
        let identity = IdentityId::new(name)?;
        self.identities.sign_in(identity.clone());
        let state = self
            .wait_for(move |s| s.identity.as_ref() == Some(&identity) && !s.is_loading)
            .await
            .with_context(|| format!("{name} never finished signing in"))?;
        info!(identity = name, events = state.events.len(), "👤 Signed in");
        Ok(state)
    }

    pub async fn sign_out(&self) -> Result<Arc<EntityState>> {
        self.identities.sign_out();
        self.wait_for(|s| s.identity.is_none())
            .await
            .context("sign out never reached the cache")
    }

    /// Wait until the cache satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<Arc<EntityState>>
    where
        F: Fn(&EntityState) -> bool,
    {
        timeout(SETTLE_TIMEOUT, self.engine.store().wait_until(predicate))
            .await
            .context("Timed out waiting for the cache")
    }

    /// Number of documents directly inside `collection`
    pub async fn count_in(&self, collection: &CollectionPath) -> usize {
        self.remote.documents_in(collection).await.len()
    }

    pub async fn cleanup(self) -> Result<()> {
        info!("🧹 Shutting down test engine");
        self.engine.shutdown().await;
        Ok(())
    }
}

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
