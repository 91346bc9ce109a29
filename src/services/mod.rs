//! Services layer - Business logic
//!
//! This module contains all business logic services for CRAS Agenda.
//! Services are responsible for:
//! - Implementing business and permission rules
//! - Coordinating between repositories, the agenda cache and the audit log
//! - Handling validation and error cases

pub mod agenda;
pub mod appointment;
pub mod audit;
pub mod blocked_slot;
pub mod cras;
pub mod error;
pub mod password;
pub mod user;

pub use agenda::{AgendaService, InterviewerAgenda, ReceptionAgenda};
pub use appointment::AppointmentService;
pub use audit::AuditService;
pub use blocked_slot::BlockedSlotService;
pub use cras::CrasService;
pub use error::ServiceError;
pub use password::{hash_password, verify_password};
pub use user::UserService;

use std::sync::Arc;

use crate::agenda::{AgendaError, SlotGrid};
use crate::cache::create_cache;
use crate::config::Config;
use crate::db::Store;

/// Every service, wired to one store
#[derive(Clone)]
pub struct Services {
    pub store: Store,
    pub users: Arc<UserService>,
    pub cras: Arc<CrasService>,
    pub appointments: Arc<AppointmentService>,
    pub blocked_slots: Arc<BlockedSlotService>,
    pub agenda: Arc<AgendaService>,
    pub audit: Arc<AuditService>,
}

impl Services {
    pub fn new(store: Store, config: &Config) -> Result<Self, AgendaError> {
        let grid = Arc::new(SlotGrid::from_config(&config.agenda)?);
        let cache = create_cache(&config.cache);

        let audit = Arc::new(AuditService::new(store.audit_logs.clone()));
        let agenda = Arc::new(AgendaService::new(store.clone(), grid, cache, &config.agenda));
        let users = Arc::new(
            UserService::new(store.users.clone(), store.cras.clone(), audit.clone()).with_agenda(agenda.clone()),
        );
        let cras = Arc::new(CrasService::new(store.cras.clone(), audit.clone()));
        let appointments = Arc::new(AppointmentService::new(
            store.appointments.clone(),
            store.users.clone(),
            store.cras.clone(),
            agenda.clone(),
            audit.clone(),
        ));
        let blocked_slots = Arc::new(BlockedSlotService::new(
            store.blocked_slots.clone(),
            store.appointments.clone(),
            store.users.clone(),
            agenda.clone(),
            audit.clone(),
        ));

        Ok(Self {
            store,
            users,
            cras,
            appointments,
            blocked_slots,
            agenda,
            audit,
        })
    }
}
