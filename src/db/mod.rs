//! Record store
//!
//! `Store` bundles one repository per entity behind trait objects, so the
//! services never see which backend holds the records. The backend shipped
//! here keeps everything in memory and can be filled from a JSON snapshot
//! (see [`seed`]).
//!
//! # Usage
//!
//! ```ignore
//! use cras_agenda::db::Store;
//!
//! let store = Store::in_memory();
//! store.load_seed(Path::new("data/seed.json")).await?;
//! ```

pub mod repositories;
pub mod seed;

use std::sync::Arc;

use repositories::{
    AppointmentRepository, AuditLogRepository, BlockedSlotRepository, CrasRepository,
    InMemoryAppointmentRepository, InMemoryAuditLogRepository, InMemoryBlockedSlotRepository,
    InMemoryCrasRepository, InMemoryUserRepository, UserRepository,
};

pub use seed::{SeedData, SeedSummary};

/// Shared handles to every repository
#[derive(Clone)]
pub struct Store {
    pub appointments: Arc<dyn AppointmentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub cras: Arc<dyn CrasRepository>,
    pub blocked_slots: Arc<dyn BlockedSlotRepository>,
    pub audit_logs: Arc<dyn AuditLogRepository>,
}

impl Store {
    /// Empty store backed by process memory
    pub fn in_memory() -> Self {
        Self {
            appointments: InMemoryAppointmentRepository::boxed(),
            users: InMemoryUserRepository::boxed(),
            cras: InMemoryCrasRepository::boxed(),
            blocked_slots: InMemoryBlockedSlotRepository::boxed(),
            audit_logs: InMemoryAuditLogRepository::boxed(),
        }
    }
}
