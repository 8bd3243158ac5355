use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::client::ProviderClient;
use super::error::{LlmuxError, Result};
use crate::config::AppConfig;
use crate::providers::ProviderId;
use crate::providers::factory::{ProviderSettings, create_provider_with_client};
use crate::providers::http::HttpClient;

pub type ProviderFactory = Arc<dyn Fn() -> Result<Arc<dyn ProviderClient>> + Send + Sync>;

/// Maps provider identifiers to constructors. Each identifier can be
/// registered once; lookups never block each other.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<BTreeMap<ProviderId, ProviderFactory>>,
}

static GLOBAL: OnceLock<ProviderRegistry> = OnceLock::new();

/// The process-wide registry. Starts empty.
pub fn global() -> &'static ProviderRegistry {
    GLOBAL.get_or_init(ProviderRegistry::new)
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in vendor wired to `config`.
    pub fn with_builtins(config: &AppConfig) -> Result<Self> {
        let registry = Self::new();
        registry.register_builtins(config)?;
        Ok(registry)
    }

    pub fn register<F>(&self, id: ProviderId, factory: F) -> Result<()>
    where
        F: Fn() -> Result<Arc<dyn ProviderClient>> + Send + Sync + 'static,
    {
        match self.factories.write().entry(id) {
            Entry::Occupied(_) => Err(LlmuxError::DuplicateProvider(id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(factory));
                debug!(provider = %id, "registered provider factory");
                Ok(())
            }
        }
    }

    /// Registers every built-in vendor. All of them send through one
    /// connection pool built from `config`.
    pub fn register_builtins(&self, config: &AppConfig) -> Result<()> {
        let http = HttpClient::with_config(config.http_config())?;
        for id in ProviderId::ALL {
            let settings = ProviderSettings::from_config(id, config);
            let http = http.clone();
            self.register(id, move || Ok(create_provider_with_client(id, &settings, &http)))?;
        }
        Ok(())
    }

    pub fn resolve(&self, id: ProviderId) -> Result<Arc<dyn ProviderClient>> {
        let factory = self
            .factories
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| LlmuxError::UnknownProvider(id.to_string()))?;
        factory()
    }

    /// Parses `name` (aliases allowed) and resolves it.
    pub fn resolve_name(&self, name: &str) -> Result<Arc<dyn ProviderClient>> {
        self.resolve(name.parse()?)
    }

    #[must_use]
    pub fn contains(&self, id: ProviderId) -> bool {
        self.factories.read().contains_key(&id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ProviderId> {
        self.factories.read().keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
