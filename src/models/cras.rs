//! CRAS unit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical social-assistance unit. Appointments, blocks and staff all
/// hang off one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cras {
    pub id: Uuid,
    /// Display name, unique ignoring case
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Cras {
    pub fn new(name: String, address: String, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            address,
            phone,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCrasInput {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Input for updating a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCrasInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

impl UpdateCrasInput {
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.address.is_some() || self.phone.is_some() || self.active.is_some()
    }
}
