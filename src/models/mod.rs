//! Data models
//!
//! This module contains all data structures used throughout CRAS Agenda.
//! Models represent:
//! - Stored records (Appointment, User, Cras, BlockedSlot, AuditLog)
//! - Service input types
//! - List filters and pagination

mod appointment;
mod audit_log;
mod blocked_slot;
mod cras;
mod pagination;
mod user;

pub use appointment::{
    Appointment, AppointmentFilter, AppointmentStatus, CreateAppointmentInput,
    UpdateAppointmentInput,
};
pub use audit_log::{AuditLog, AuditLogFilter, EntityKind, LogAction};
pub use blocked_slot::{BlockedSlot, CreateBlockedSlotInput};
pub use cras::{CreateCrasInput, Cras, UpdateCrasInput};
pub use pagination::{ListParams, PagedResult};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};
