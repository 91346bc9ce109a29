//! CRAS unit repository

use crate::models::Cras;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait CrasRepository: Send + Sync {
    async fn create(&self, cras: &Cras) -> Result<Cras>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Cras>>;
    /// Case-insensitive name lookup
    async fn get_by_name(&self, name: &str) -> Result<Option<Cras>>;
    async fn update(&self, cras: &Cras) -> Result<Cras>;
    /// All units ordered by name
    async fn list(&self) -> Result<Vec<Cras>>;
}

#[derive(Default)]
pub struct InMemoryCrasRepository {
    items: RwLock<HashMap<Uuid, Cras>>,
}

impl InMemoryCrasRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn CrasRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl CrasRepository for InMemoryCrasRepository {
    async fn create(&self, cras: &Cras) -> Result<Cras> {
        let mut items = self.items.write().await;
        if items.contains_key(&cras.id) {
            anyhow::bail!("CRAS {} already exists", cras.id);
        }
        items.insert(cras.id, cras.clone());
        Ok(cras.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Cras>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Cras>> {
        let wanted = name.trim().to_lowercase();
        let items = self.items.read().await;
        Ok(items.values().find(|c| c.name.to_lowercase() == wanted).cloned())
    }

    async fn update(&self, cras: &Cras) -> Result<Cras> {
        let mut items = self.items.write().await;
        match items.get_mut(&cras.id) {
            Some(slot) => {
                *slot = cras.clone();
                Ok(cras.clone())
            }
            None => anyhow::bail!("CRAS {} not found", cras.id),
        }
    }

    async fn list(&self) -> Result<Vec<Cras>> {
        let mut units: Vec<Cras> = self.items.read().await.values().cloned().collect();
        units.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(units)
    }
}
