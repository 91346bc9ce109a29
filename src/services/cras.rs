//! CRAS unit service

use crate::db::repositories::CrasRepository;
use crate::models::{CreateCrasInput, Cras, EntityKind, LogAction, UpdateCrasInput, User};
use crate::services::audit::AuditService;
use crate::services::ServiceError;
use crate::validation::{is_valid_phone, normalize_phone};
use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct CrasService {
    repo: Arc<dyn CrasRepository>,
    audit: Arc<AuditService>,
}

impl CrasService {
    pub fn new(repo: Arc<dyn CrasRepository>, audit: Arc<AuditService>) -> Self {
        Self { repo, audit }
    }

    pub async fn create(&self, actor: &User, input: CreateCrasInput) -> Result<Cras, ServiceError> {
        require_admin(actor)?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("CRAS name cannot be empty"));
        }
        self.ensure_name_free(&name, None).await?;
        let phone = clean_phone(input.phone)?;

        let cras = Cras::new(name, input.address.trim().to_string(), phone);
        let saved = self.repo.create(&cras).await.context("Failed to create CRAS")?;
        self.audit
            .record(actor.id, LogAction::Create, EntityKind::Cras, saved.id, json!({ "name": saved.name }))
            .await?;
        tracing::info!(actor = %actor.id, cras_id = %saved.id, name = %saved.name, "CRAS created");
        Ok(saved)
    }

    pub async fn update(&self, actor: &User, id: Uuid, input: UpdateCrasInput) -> Result<Cras, ServiceError> {
        require_admin(actor)?;
        let mut cras = self.get(id).await?;
        if !input.has_changes() {
            return Ok(cras);
        }

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::validation("CRAS name cannot be empty"));
            }
            self.ensure_name_free(&name, Some(cras.id)).await?;
            cras.name = name;
        }
        if let Some(address) = input.address {
            cras.address = address.trim().to_string();
        }
        if input.phone.is_some() {
            cras.phone = clean_phone(input.phone)?;
        }
        if let Some(active) = input.active {
            cras.active = active;
        }
        cras.updated_at = Utc::now();

        let saved = self.repo.update(&cras).await.context("Failed to update CRAS")?;
        self.audit
            .record(
                actor.id,
                LogAction::Update,
                EntityKind::Cras,
                saved.id,
                json!({ "name": saved.name, "active": saved.active }),
            )
            .await?;
        Ok(saved)
    }

    /// Close a unit. Its records stay; it just stops accepting bookings.
    pub async fn deactivate(&self, actor: &User, id: Uuid) -> Result<Cras, ServiceError> {
        require_admin(actor)?;
        let mut cras = self.get(id).await?;
        cras.active = false;
        cras.updated_at = Utc::now();
        let saved = self.repo.update(&cras).await.context("Failed to update CRAS")?;
        self.audit
            .record(actor.id, LogAction::Delete, EntityKind::Cras, saved.id, json!({ "active": false }))
            .await?;
        tracing::info!(actor = %actor.id, cras_id = %saved.id, "CRAS deactivated");
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> Result<Cras, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get CRAS")?
            .ok_or_else(|| ServiceError::not_found(format!("CRAS {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Cras>, ServiceError> {
        Ok(self.repo.list().await.context("Failed to list CRAS")?)
    }

    pub async fn list_active(&self) -> Result<Vec<Cras>, ServiceError> {
        let all = self.list().await?;
        Ok(all.into_iter().filter(|c| c.active).collect())
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        match self.repo.get_by_name(name).await.context("Failed to check CRAS name")? {
            Some(existing) if Some(existing.id) != except => {
                Err(ServiceError::conflict(format!("CRAS '{}' already exists", name)))
            }
            _ => Ok(()),
        }
    }
}

fn clean_phone(phone: Option<String>) -> Result<Option<String>, ServiceError> {
    match phone.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(p) if is_valid_phone(p) => Ok(normalize_phone(p)),
        Some(_) => Err(ServiceError::validation("Invalid phone number")),
    }
}

fn require_admin(actor: &User) -> Result<(), ServiceError> {
    if actor.is_admin() && actor.active {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Administrator role required"))
    }
}
