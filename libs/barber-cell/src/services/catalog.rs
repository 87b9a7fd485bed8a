// libs/barber-cell/src/services/catalog.rs
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CatalogError, CatalogSnapshot, Provider, Service};

/// Read access to provider profiles, working hours and services.
///
/// Every call returns an owned snapshot so callers can compute against a
/// value that cannot change underneath them.
#[async_trait]
pub trait ScheduleCatalog: Send + Sync {
    async fn provider(&self, provider_id: Uuid) -> Option<Provider>;

    async fn service(&self, service_id: Uuid) -> Option<Service>;
}

#[derive(Default)]
struct CatalogInner {
    providers: HashMap<Uuid, Provider>,
    // service id -> owning provider id
    service_owners: HashMap<Uuid, Uuid>,
}

#[derive(Default)]
pub struct InMemoryScheduleCatalog {
    inner: RwLock<CatalogInner>,
}

impl InMemoryScheduleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for provider in snapshot.providers {
            catalog.upsert_provider(provider).await?;
        }
        Ok(catalog)
    }

    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        debug!("Loading provider catalog from {}", path.display());

        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&raw)?;
        let catalog = Self::from_snapshot(snapshot).await?;

        info!("Loaded {} providers from {}", catalog.provider_count().await, path.display());
        Ok(catalog)
    }

    /// Inserts or replaces a provider after validating its schedule and
    /// services. Services inherit the provider's id.
    pub async fn upsert_provider(&self, mut provider: Provider) -> Result<(), CatalogError> {
        for service in provider.services.iter_mut() {
            service.provider_id = provider.id;
        }
        provider.validate()?;

        let mut inner = self.inner.write().await;

        for service in &provider.services {
            if let Some(owner_id) = inner.service_owners.get(&service.id) {
                if *owner_id != provider.id {
                    return Err(CatalogError::ServiceOwnedElsewhere {
                        service_id: service.id,
                        owner_id: *owner_id,
                    });
                }
            }
        }

        let provider_id = provider.id;
        inner.service_owners.retain(|_, owner| *owner != provider_id);
        for service in &provider.services {
            inner.service_owners.insert(service.id, provider_id);
        }
        inner.providers.insert(provider_id, provider);

        debug!("Provider {} stored in catalog", provider_id);
        Ok(())
    }

    pub async fn provider_count(&self) -> usize {
        self.inner.read().await.providers.len()
    }
}

#[async_trait]
impl ScheduleCatalog for InMemoryScheduleCatalog {
    async fn provider(&self, provider_id: Uuid) -> Option<Provider> {
        self.inner.read().await.providers.get(&provider_id).cloned()
    }

    async fn service(&self, service_id: Uuid) -> Option<Service> {
        let inner = self.inner.read().await;
        let owner_id = inner.service_owners.get(&service_id)?;
        inner
            .providers
            .get(owner_id)
            .and_then(|provider| provider.service(service_id))
            .cloned()
    }
}
