//! JSON snapshot loading
//!
//! A snapshot is one JSON object with optional `cras`, `users`,
//! `appointments` and `blocked_slots` arrays, in the same shape the
//! records serialize to. Users may carry a `password_hash`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Store;
use crate::models::{Appointment, BlockedSlot, Cras, User};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub cras: Vec<Cras>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub blocked_slots: Vec<BlockedSlot>,
}

/// How many records of each kind were loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub cras: usize,
    pub users: usize,
    pub appointments: usize,
    pub blocked_slots: usize,
}

impl SeedData {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid seed JSON")
    }
}

impl Store {
    /// Insert every record of `data`
    pub async fn import(&self, data: SeedData) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        for cras in &data.cras {
            self.cras.create(cras).await.with_context(|| format!("Failed to import CRAS '{}'", cras.name))?;
            summary.cras += 1;
        }
        for user in &data.users {
            let mut user = user.clone();
            user.email = user.email.to_lowercase();
            self.users.create(&user).await.with_context(|| format!("Failed to import user '{}'", user.email))?;
            summary.users += 1;
        }
        for appointment in &data.appointments {
            self.appointments
                .create(appointment)
                .await
                .with_context(|| format!("Failed to import appointment {}", appointment.id))?;
            summary.appointments += 1;
        }
        for block in &data.blocked_slots {
            self.blocked_slots
                .create(block)
                .await
                .with_context(|| format!("Failed to import blocked slot {}", block.id))?;
            summary.blocked_slots += 1;
        }

        Ok(summary)
    }

    /// Load a snapshot file. A missing file loads nothing.
    pub async fn load_seed(&self, path: &Path) -> Result<SeedSummary> {
        if !path.exists() {
            tracing::warn!("Seed file {} not found, starting empty", path.display());
            return Ok(SeedSummary::default());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;
        let data = SeedData::from_json(&content)
            .with_context(|| format!("Failed to parse seed file '{}'", path.display()))?;
        let summary = self.import(data).await?;
        tracing::info!(
            cras = summary.cras,
            users = summary.users,
            appointments = summary.appointments,
            blocked_slots = summary.blocked_slots,
            "Seed data loaded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use uuid::Uuid;

    const SEED: &str = r#"{
        "cras": [{
            "id": "6f1c2b8e-0000-4000-8000-000000000001",
            "name": "CRAS Centro",
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-01T00:00:00Z"
        }],
        "users": [{
            "id": "6f1c2b8e-0000-4000-8000-000000000002",
            "name": "Paula",
            "email": "Paula@Cras.gov.br",
            "role": "entrevistador",
            "cras_id": "6f1c2b8e-0000-4000-8000-000000000001",
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-01T00:00:00Z"
        }],
        "appointments": [{
            "id": "6f1c2b8e-0000-4000-8000-000000000003",
            "cras_id": "6f1c2b8e-0000-4000-8000-000000000001",
            "interviewer_id": "6f1c2b8e-0000-4000-8000-000000000002",
            "date": "2030-03-04",
            "time": "08:00:00",
            "citizen_name": "Jorge",
            "citizen_cpf": "52998224725",
            "citizen_phone": "11987654321",
            "status": "agendado",
            "created_by": "6f1c2b8e-0000-4000-8000-000000000002",
            "updated_by": "6f1c2b8e-0000-4000-8000-000000000002",
            "created_at": "2030-01-01T00:00:00Z",
            "updated_at": "2030-01-01T00:00:00Z"
        }]
    }"#;

    #[tokio::test]
    async fn test_load_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SEED).unwrap();

        let store = Store::in_memory();
        let summary = store.load_seed(file.path()).await.unwrap();

        assert_eq!(summary, SeedSummary { cras: 1, users: 1, appointments: 1, blocked_slots: 0 });
        let user = store.users.get_by_email("paula@cras.gov.br").await.unwrap().unwrap();
        assert!(user.active);
        assert!(user.is_interviewer());
        let id = Uuid::parse_str("6f1c2b8e-0000-4000-8000-000000000003").unwrap();
        assert!(store.appointments.get_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_seed_file_loads_nothing() {
        let store = Store::in_memory();
        let summary = store.load_seed(Path::new("no/such/seed.json")).await.unwrap();
        assert_eq!(summary, SeedSummary::default());
    }

    #[tokio::test]
    async fn test_invalid_seed_reports_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ \"cras\": 42 }}").unwrap();

        let store = Store::in_memory();
        let err = store.load_seed(file.path()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("seed"));
    }
}
