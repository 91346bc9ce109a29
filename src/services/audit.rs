//! Audit log service

use crate::db::repositories::AuditLogRepository;
use crate::models::{AuditLog, AuditLogFilter, EntityKind, ListParams, LogAction, PagedResult};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

pub struct AuditService {
    repo: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<dyn AuditLogRepository>) -> Self {
        Self { repo }
    }

    /// Append one entry
    pub async fn record(
        &self,
        user_id: Uuid,
        action: LogAction,
        entity: EntityKind,
        entity_id: Uuid,
        details: serde_json::Value,
    ) -> Result<AuditLog, ServiceError> {
        let log = AuditLog::new(user_id, action, entity, entity_id, details);
        let saved = self.repo.create(&log).await.context("Failed to write audit log")?;
        tracing::debug!(%user_id, action = %action, entity = %entity, %entity_id, "Audit entry recorded");
        Ok(saved)
    }

    /// One page of matching entries, newest first
    pub async fn list(
        &self,
        filter: &AuditLogFilter,
        params: &ListParams,
    ) -> Result<PagedResult<AuditLog>, ServiceError> {
        let entries = self.repo.list(filter).await.context("Failed to list audit log")?;
        Ok(params.paginate(entries))
    }

    /// Full history of one record, newest first
    pub async fn history(&self, entity: EntityKind, entity_id: Uuid) -> Result<Vec<AuditLog>, ServiceError> {
        let filter = AuditLogFilter {
            entity: Some(entity),
            entity_id: Some(entity_id),
            ..Default::default()
        };
        Ok(self.repo.list(&filter).await.context("Failed to list audit log")?)
    }
}
