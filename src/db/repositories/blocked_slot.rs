//! Blocked slot repository

use crate::models::BlockedSlot;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait BlockedSlotRepository: Send + Sync {
    async fn create(&self, block: &BlockedSlot) -> Result<BlockedSlot>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlockedSlot>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list_for_interviewer(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlockedSlot>>;
    async fn list_for_cras_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedSlot>>;
}

#[derive(Default)]
pub struct InMemoryBlockedSlotRepository {
    items: RwLock<HashMap<Uuid, BlockedSlot>>,
}

impl InMemoryBlockedSlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn BlockedSlotRepository> {
        Arc::new(Self::new())
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<BlockedSlot>
    where
        F: Fn(&BlockedSlot) -> bool,
    {
        let items = self.items.read().await;
        let mut result: Vec<BlockedSlot> = items.values().filter(|b| predicate(b)).cloned().collect();
        result.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        result
    }
}

#[async_trait]
impl BlockedSlotRepository for InMemoryBlockedSlotRepository {
    async fn create(&self, block: &BlockedSlot) -> Result<BlockedSlot> {
        let mut items = self.items.write().await;
        if items.contains_key(&block.id) {
            anyhow::bail!("Blocked slot {} already exists", block.id);
        }
        items.insert(block.id, block.clone());
        Ok(block.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<BlockedSlot>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.items.write().await.remove(&id);
        Ok(())
    }

    async fn list_for_interviewer(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlockedSlot>> {
        Ok(self
            .filtered(|b| b.interviewer_id == interviewer_id && b.date >= from && b.date <= to)
            .await)
    }

    async fn list_for_cras_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<Vec<BlockedSlot>> {
        Ok(self.filtered(|b| b.cras_id == cras_id && b.date == date).await)
    }
}
