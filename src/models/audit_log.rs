//! Audit log model
//!
//! Every change made through the services leaves one `AuditLog` entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    /// User who performed the action
    pub user_id: Uuid,
    pub action: LogAction,
    pub entity: EntityKind,
    pub entity_id: Uuid,
    /// Free-form snapshot of what changed
    #[serde(default)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        user_id: Uuid,
        action: LogAction,
        entity: EntityKind,
        entity_id: Uuid,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action,
            entity,
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Create,
    Update,
    Confirm,
    Complete,
    Miss,
    Cancel,
    Delete,
    Block,
    Unblock,
    Login,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Create => "create",
            LogAction::Update => "update",
            LogAction::Confirm => "confirm",
            LogAction::Complete => "complete",
            LogAction::Miss => "miss",
            LogAction::Cancel => "cancel",
            LogAction::Delete => "delete",
            LogAction::Block => "block",
            LogAction::Unblock => "unblock",
            LogAction::Login => "login",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Appointment,
    User,
    Cras,
    BlockedSlot,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Appointment => "appointment",
            EntityKind::User => "user",
            EntityKind::Cras => "cras",
            EntityKind::BlockedSlot => "blocked_slot",
        };
        f.write_str(s)
    }
}

/// Filter for audit log listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<Uuid>,
    pub entity: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
    pub action: Option<LogAction>,
}

impl AuditLogFilter {
    pub fn matches(&self, log: &AuditLog) -> bool {
        self.user_id.map_or(true, |id| log.user_id == id)
            && self.entity.map_or(true, |e| log.entity == e)
            && self.entity_id.map_or(true, |id| log.entity_id == id)
            && self.action.map_or(true, |a| log.action == a)
    }
}
