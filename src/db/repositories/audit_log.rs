//! Audit log repository (append-only)

use crate::models::{AuditLog, AuditLogFilter};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn create(&self, log: &AuditLog) -> Result<AuditLog>;
    /// Matching entries, newest first
    async fn list(&self, filter: &AuditLogFilter) -> Result<Vec<AuditLog>>;
}

#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    items: RwLock<Vec<AuditLog>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn AuditLogRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, log: &AuditLog) -> Result<AuditLog> {
        self.items.write().await.push(log.clone());
        Ok(log.clone())
    }

    async fn list(&self, filter: &AuditLogFilter) -> Result<Vec<AuditLog>> {
        let items = self.items.read().await;
        // Append-only, so reverse insertion order is newest first
        Ok(items
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }
}
