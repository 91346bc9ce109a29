//! Record repositories
//!
//! One repository trait per entity. The in-memory implementations back the
//! services and the CLI; a database-backed store plugs in by implementing
//! the same traits.

pub mod appointment;
pub mod audit_log;
pub mod blocked_slot;
pub mod cras;
pub mod user;

pub use appointment::{AppointmentRepository, InMemoryAppointmentRepository};
pub use audit_log::{AuditLogRepository, InMemoryAuditLogRepository};
pub use blocked_slot::{BlockedSlotRepository, InMemoryBlockedSlotRepository};
pub use cras::{CrasRepository, InMemoryCrasRepository};
pub use user::{InMemoryUserRepository, UserRepository};
