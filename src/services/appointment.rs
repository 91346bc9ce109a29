//! Appointment service
//!
//! Booking lifecycle of citizen interviews. Who may do what:
//! - reception staff of the unit and admins book, edit and cancel
//! - the assigned interviewer, reception of the unit and admins confirm,
//!   complete and mark no-shows
//! - only admins delete
//!
//! Slot checks and writes run under the agenda booking lock.

use crate::db::repositories::{AppointmentRepository, CrasRepository, UserRepository};
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, CreateAppointmentInput, EntityKind, ListParams,
    LogAction, PagedResult, UpdateAppointmentInput, User, UserRole,
};
use crate::services::agenda::AgendaService;
use crate::services::audit::AuditService;
use crate::services::ServiceError;
use crate::validation::{normalize_cpf, normalize_phone, validate_citizen_name};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct AppointmentService {
    repo: Arc<dyn AppointmentRepository>,
    users: Arc<dyn UserRepository>,
    cras: Arc<dyn CrasRepository>,
    agenda: Arc<AgendaService>,
    audit: Arc<AuditService>,
}

impl AppointmentService {
    pub fn new(
        repo: Arc<dyn AppointmentRepository>,
        users: Arc<dyn UserRepository>,
        cras: Arc<dyn CrasRepository>,
        agenda: Arc<AgendaService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            repo,
            users,
            cras,
            agenda,
            audit,
        }
    }

    /// Book a slot
    pub async fn create(&self, actor: &User, input: CreateAppointmentInput) -> Result<Appointment, ServiceError> {
        require_desk(actor, input.cras_id)?;

        let citizen_name = validate_citizen_name(&input.citizen_name).map_err(ServiceError::Validation)?;
        let citizen_cpf = normalize_cpf(&input.citizen_cpf).ok_or_else(|| ServiceError::validation("Invalid CPF"))?;
        let citizen_phone =
            normalize_phone(&input.citizen_phone).ok_or_else(|| ServiceError::validation("Invalid phone number"))?;

        self.active_cras(input.cras_id).await?;
        self.assignable_interviewer(input.interviewer_id, input.cras_id).await?;

        let _guard = self.agenda.lock_slots().await;
        self.agenda
            .ensure_bookable(input.interviewer_id, input.date, input.time, None)
            .await?;
        self.ensure_no_same_day_booking(&citizen_cpf, input.date, None).await?;

        let mut appointment = Appointment::new(
            input.cras_id,
            input.interviewer_id,
            input.date,
            input.time,
            citizen_name,
            citizen_cpf,
            citizen_phone,
            input.reason.trim().to_string(),
            actor.id,
        );
        appointment.notes = clean_notes(input.notes);

        let saved = self.repo.create(&appointment).await.context("Failed to create appointment")?;
        self.agenda.invalidate(saved.interviewer_id, saved.date).await;

        self.audit
            .record(
                actor.id,
                LogAction::Create,
                EntityKind::Appointment,
                saved.id,
                json!({
                    "interviewer_id": saved.interviewer_id,
                    "date": saved.date,
                    "time": saved.time,
                }),
            )
            .await?;
        tracing::info!(
            actor = %actor.id,
            appointment_id = %saved.id,
            interviewer_id = %saved.interviewer_id,
            date = %saved.date,
            time = %saved.time,
            "Appointment booked"
        );
        Ok(saved)
    }

    /// Edit citizen data or reschedule.
    ///
    /// Changing date, time or interviewer re-runs every slot check and sends
    /// a confirmed appointment back to scheduled.
    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        input: UpdateAppointmentInput,
    ) -> Result<Appointment, ServiceError> {
        // Read under the lock so a concurrent status change is never overwritten
        let _guard = self.agenda.lock_slots().await;
        let current = self.get(id).await?;
        require_desk(actor, current.cras_id)?;
        if !current.status.is_editable() {
            return Err(ServiceError::InvalidTransition(format!(
                "A {} appointment cannot be edited",
                current.status
            )));
        }
        if !input.has_changes() {
            return Ok(current);
        }

        let mut updated = current.clone();
        if let Some(name) = &input.citizen_name {
            updated.citizen_name = validate_citizen_name(name).map_err(ServiceError::Validation)?;
        }
        if let Some(cpf) = &input.citizen_cpf {
            updated.citizen_cpf = normalize_cpf(cpf).ok_or_else(|| ServiceError::validation("Invalid CPF"))?;
        }
        if let Some(phone) = &input.citizen_phone {
            updated.citizen_phone =
                normalize_phone(phone).ok_or_else(|| ServiceError::validation("Invalid phone number"))?;
        }
        if let Some(reason) = &input.reason {
            updated.reason = reason.trim().to_string();
        }
        if input.notes.is_some() {
            updated.notes = clean_notes(input.notes.clone());
        }
        if let Some(interviewer_id) = input.interviewer_id {
            updated.interviewer_id = interviewer_id;
        }
        if let Some(date) = input.date {
            updated.date = date;
        }
        if let Some(time) = input.time {
            updated.time = time;
        }

        let moved = updated.interviewer_id != current.interviewer_id
            || updated.date != current.date
            || updated.time != current.time;
        if updated.interviewer_id != current.interviewer_id {
            self.assignable_interviewer(updated.interviewer_id, updated.cras_id).await?;
        }

        if moved {
            self.agenda
                .ensure_bookable(updated.interviewer_id, updated.date, updated.time, Some(id))
                .await?;
            if updated.status == AppointmentStatus::Confirmed {
                updated.status = AppointmentStatus::Scheduled;
            }
        }
        if moved || updated.citizen_cpf != current.citizen_cpf {
            self.ensure_no_same_day_booking(&updated.citizen_cpf, updated.date, Some(id))
                .await?;
        }

        updated.updated_by = actor.id;
        updated.updated_at = Utc::now();
        let saved = self.repo.update(&updated).await.context("Failed to update appointment")?;

        self.agenda.invalidate(current.interviewer_id, current.date).await;
        if moved {
            self.agenda.invalidate(saved.interviewer_id, saved.date).await;
        }

        self.audit
            .record(
                actor.id,
                LogAction::Update,
                EntityKind::Appointment,
                saved.id,
                json!({
                    "rescheduled": moved,
                    "from": { "interviewer_id": current.interviewer_id, "date": current.date, "time": current.time },
                    "to": { "interviewer_id": saved.interviewer_id, "date": saved.date, "time": saved.time },
                }),
            )
            .await?;
        if moved {
            tracing::info!(
                actor = %actor.id,
                appointment_id = %saved.id,
                date = %saved.date,
                time = %saved.time,
                "Appointment rescheduled"
            );
        }
        Ok(saved)
    }

    pub async fn confirm(&self, actor: &User, id: Uuid) -> Result<Appointment, ServiceError> {
        self.transition(actor, id, AppointmentStatus::Confirmed, LogAction::Confirm, None)
            .await
    }

    pub async fn complete(&self, actor: &User, id: Uuid) -> Result<Appointment, ServiceError> {
        self.transition(actor, id, AppointmentStatus::Completed, LogAction::Complete, None)
            .await
    }

    /// The citizen did not show up
    pub async fn mark_missed(&self, actor: &User, id: Uuid) -> Result<Appointment, ServiceError> {
        self.transition(actor, id, AppointmentStatus::Missed, LogAction::Miss, None)
            .await
    }

    /// Cancel and free the slot. A reason is required.
    pub async fn cancel(&self, actor: &User, id: Uuid, reason: &str) -> Result<Appointment, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::validation("A cancellation reason is required"));
        }
        self.transition(
            actor,
            id,
            AppointmentStatus::Cancelled,
            LogAction::Cancel,
            Some(reason.to_string()),
        )
        .await
    }

    async fn transition(
        &self,
        actor: &User,
        id: Uuid,
        next: AppointmentStatus,
        action: LogAction,
        cancel_reason: Option<String>,
    ) -> Result<Appointment, ServiceError> {
        let _guard = self.agenda.lock_slots().await;
        let mut appointment = self.get(id).await?;
        if next == AppointmentStatus::Cancelled {
            require_desk(actor, appointment.cras_id)?;
        } else {
            require_attendant(actor, &appointment)?;
        }
        if !appointment.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition(format!(
                "{} -> {}",
                appointment.status, next
            )));
        }

        let previous = appointment.status;
        appointment.status = next;
        if cancel_reason.is_some() {
            appointment.cancel_reason = cancel_reason;
        }
        appointment.updated_by = actor.id;
        appointment.updated_at = Utc::now();

        let saved = self.repo.update(&appointment).await.context("Failed to update appointment")?;
        self.agenda.invalidate(saved.interviewer_id, saved.date).await;

        self.audit
            .record(
                actor.id,
                action,
                EntityKind::Appointment,
                saved.id,
                json!({ "from": previous, "to": next, "reason": saved.cancel_reason }),
            )
            .await?;
        tracing::info!(actor = %actor.id, appointment_id = %saved.id, from = %previous, to = %next, "Appointment status changed");
        Ok(saved)
    }

    /// Remove an appointment for good (admin only)
    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<(), ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::forbidden("Only administrators can delete appointments"));
        }
        let _guard = self.agenda.lock_slots().await;
        let appointment = self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete appointment")?;
        self.agenda.invalidate(appointment.interviewer_id, appointment.date).await;

        self.audit
            .record(
                actor.id,
                LogAction::Delete,
                EntityKind::Appointment,
                id,
                json!({ "citizen_cpf": appointment.citizen_cpf, "date": appointment.date, "time": appointment.time }),
            )
            .await?;
        tracing::info!(actor = %actor.id, appointment_id = %id, "Appointment deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Appointment, ServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get appointment")?
            .ok_or_else(|| ServiceError::not_found(format!("Appointment {}", id)))
    }

    /// One page of matching appointments ordered by date and time.
    ///
    /// A CPF filter may be given formatted or bare.
    pub async fn list(
        &self,
        filter: &AppointmentFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Appointment>, ServiceError> {
        let mut filter = filter.clone();
        if let Some(cpf) = &filter.citizen_cpf {
            filter.citizen_cpf = Some(crate::validation::only_digits(cpf));
        }
        let items = self.repo.list(&filter).await.context("Failed to list appointments")?;
        Ok(params.paginate(items))
    }

    /// Every appointment of a unit on one day, cancelled ones included
    pub async fn list_for_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, ServiceError> {
        Ok(self
            .repo
            .list_for_cras_day(cras_id, date)
            .await
            .context("Failed to list appointments")?)
    }

    async fn active_cras(&self, cras_id: Uuid) -> Result<(), ServiceError> {
        let cras = self
            .cras
            .get_by_id(cras_id)
            .await
            .context("Failed to get CRAS")?
            .ok_or_else(|| ServiceError::not_found(format!("CRAS {}", cras_id)))?;
        if !cras.active {
            return Err(ServiceError::validation(format!("CRAS '{}' is not active", cras.name)));
        }
        Ok(())
    }

    async fn assignable_interviewer(&self, interviewer_id: Uuid, cras_id: Uuid) -> Result<User, ServiceError> {
        let user = self
            .users
            .get_by_id(interviewer_id)
            .await
            .context("Failed to get interviewer")?
            .ok_or_else(|| ServiceError::not_found(format!("Interviewer {}", interviewer_id)))?;
        if user.role != UserRole::Entrevistador || !user.active {
            return Err(ServiceError::validation(format!("{} is not an active interviewer", user.name)));
        }
        if user.cras_id != Some(cras_id) {
            return Err(ServiceError::validation(format!("{} does not work at this CRAS", user.name)));
        }
        Ok(user)
    }

    /// A citizen holds at most one active appointment per day
    async fn ensure_no_same_day_booking(
        &self,
        cpf: &str,
        date: NaiveDate,
        ignore: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let filter = AppointmentFilter {
            citizen_cpf: Some(cpf.to_string()),
            from: Some(date),
            to: Some(date),
            ..Default::default()
        };
        let existing = self.repo.list(&filter).await.context("Failed to list appointments")?;
        if existing.iter().any(|a| a.is_active() && Some(a.id) != ignore) {
            return Err(ServiceError::conflict(format!(
                "This citizen already has an appointment on {}",
                date.format("%d/%m/%Y")
            )));
        }
        Ok(())
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Reception of the unit, or an admin
fn require_desk(actor: &User, cras_id: Uuid) -> Result<(), ServiceError> {
    if actor.active && actor.can_manage_appointments() && actor.belongs_to(cras_id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Only reception staff of this CRAS can manage its appointments"))
    }
}

/// The assigned interviewer, reception of the unit, or an admin
fn require_attendant(actor: &User, appointment: &Appointment) -> Result<(), ServiceError> {
    if actor.active && actor.is_interviewer() && actor.id == appointment.interviewer_id {
        return Ok(());
    }
    require_desk(actor, appointment.cras_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agenda::SlotGrid;
    use crate::config::{AgendaConfig, CacheConfig};
    use crate::db::Store;
    use crate::models::{BlockedSlot, Cras};
    use chrono::NaiveTime;

    struct Fixture {
        store: Store,
        service: AppointmentService,
        cras: Cras,
        admin: User,
        desk: User,
        ana: User,
        bia: User,
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> NaiveDate {
        d(2030, 3, 4)
    }

    async fn setup() -> Fixture {
        let store = Store::in_memory();
        let cras = Cras::new("CRAS Centro".into(), String::new(), None);
        store.cras.create(&cras).await.unwrap();

        let admin = User::new("Admin".into(), "admin@cras.gov.br".into(), String::new(), UserRole::Admin, None);
        let desk = User::new("Desk".into(), "desk@cras.gov.br".into(), String::new(), UserRole::Recepcao, Some(cras.id));
        let ana = User::new("Ana".into(), "ana@cras.gov.br".into(), String::new(), UserRole::Entrevistador, Some(cras.id));
        let bia = User::new("Bia".into(), "bia@cras.gov.br".into(), String::new(), UserRole::Entrevistador, Some(cras.id));
        for user in [&admin, &desk, &ana, &bia] {
            store.users.create(user).await.unwrap();
        }

        let config = AgendaConfig::default();
        let grid = Arc::new(SlotGrid::from_config(&config).unwrap());
        let agenda = Arc::new(AgendaService::new(
            store.clone(),
            grid,
            crate::cache::create_cache(&CacheConfig::default()),
            &config,
        ));
        let audit = Arc::new(AuditService::new(store.audit_logs.clone()));
        let service = AppointmentService::new(
            store.appointments.clone(),
            store.users.clone(),
            store.cras.clone(),
            agenda,
            audit,
        );

        Fixture { store, service, cras, admin, desk, ana, bia }
    }

    fn input(f: &Fixture, interviewer: Uuid, time: NaiveTime) -> CreateAppointmentInput {
        CreateAppointmentInput::new(
            f.cras.id,
            interviewer,
            monday(),
            time,
            "Maria da Silva",
            "529.982.247-25",
            "(11) 98765-4321",
        )
    }

    #[tokio::test]
    async fn test_create_normalizes_citizen_data() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        assert_eq!(a.citizen_cpf, "52998224725");
        assert_eq!(a.citizen_phone, "11987654321");
        assert_eq!(a.status, AppointmentStatus::Scheduled);
        assert_eq!(a.created_by, f.desk.id);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_documents() {
        let f = setup().await;
        let mut bad_cpf = input(&f, f.ana.id, t(8, 0));
        bad_cpf.citizen_cpf = "111.111.111-11".into();
        assert!(matches!(f.service.create(&f.desk, bad_cpf).await, Err(ServiceError::Validation(_))));

        let mut bad_phone = input(&f, f.ana.id, t(8, 0));
        bad_phone.citizen_phone = "(01) 2345-6789".into();
        assert!(matches!(f.service.create(&f.desk, bad_phone).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_double_booking_conflicts() {
        let f = setup().await;
        f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();

        let mut other = input(&f, f.ana.id, t(8, 0));
        other.citizen_cpf = "11144477735".into();
        let result = f.service.create(&f.desk, other).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_same_cpf_same_day_conflicts() {
        let f = setup().await;
        f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        let result = f.service.create(&f.desk, input(&f, f.bia.id, t(9, 0))).await;
        assert!(matches!(result, Err(ServiceError::Conflict(msg)) if msg.contains("04/03/2030")));
    }

    #[tokio::test]
    async fn test_blocked_slot_conflicts() {
        let f = setup().await;
        let block = BlockedSlot::new(f.cras.id, f.ana.id, monday(), Some(t(8, 0)), "Reunião".into(), f.admin.id);
        f.store.blocked_slots.create(&block).await.unwrap();

        let result = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await;
        assert!(matches!(result, Err(ServiceError::Conflict(msg)) if msg.contains("Reunião")));
    }

    #[tokio::test]
    async fn test_permissions() {
        let f = setup().await;
        let interviewer_books = f.service.create(&f.ana, input(&f, f.ana.id, t(8, 0))).await;
        assert!(matches!(interviewer_books, Err(ServiceError::Forbidden(_))));

        let other_unit = User::new(
            "Outra".into(),
            "outra@cras.gov.br".into(),
            String::new(),
            UserRole::Recepcao,
            Some(Uuid::new_v4()),
        );
        let result = f.service.create(&other_unit, input(&f, f.ana.id, t(8, 0))).await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));

        let a = f.service.create(&f.admin, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        assert!(matches!(f.service.confirm(&f.bia, a.id).await, Err(ServiceError::Forbidden(_))));
        assert!(f.service.confirm(&f.ana, a.id).await.is_ok());
        assert!(matches!(f.service.cancel(&f.ana, a.id, "x").await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(f.service.delete(&f.desk, a.id).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();

        let early = f.service.complete(&f.ana, a.id).await;
        assert!(matches!(early, Err(ServiceError::InvalidTransition(_))));

        f.service.confirm(&f.ana, a.id).await.unwrap();
        let done = f.service.complete(&f.ana, a.id).await.unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);

        let after = f.service.cancel(&f.desk, a.id, "mudou de ideia").await;
        assert!(matches!(after, Err(ServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_mark_missed_is_terminal() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();

        let missed = f.service.mark_missed(&f.ana, a.id).await.unwrap();
        assert_eq!(missed.status, AppointmentStatus::Missed);

        assert!(matches!(f.service.confirm(&f.ana, a.id).await, Err(ServiceError::InvalidTransition(_))));
        assert!(matches!(f.service.complete(&f.ana, a.id).await, Err(ServiceError::InvalidTransition(_))));
        assert!(matches!(f.service.mark_missed(&f.ana, a.id).await, Err(ServiceError::InvalidTransition(_))));
        assert!(matches!(
            f.service.cancel(&f.desk, a.id, "Tarde demais").await,
            Err(ServiceError::InvalidTransition(_))
        ));
        let edit = f.service.update(&f.desk, a.id, UpdateAppointmentInput::new().with_notes("x")).await;
        assert!(matches!(edit, Err(ServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_cancel_frees_the_slot() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();

        assert!(matches!(f.service.cancel(&f.desk, a.id, "  ").await, Err(ServiceError::Validation(_))));
        let cancelled = f.service.cancel(&f.desk, a.id, "Cidadão desistiu").await.unwrap();
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("Cidadão desistiu"));

        let again = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_reschedule_resets_confirmation() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        f.service.confirm(&f.desk, a.id).await.unwrap();

        let moved = f
            .service
            .update(&f.desk, a.id, UpdateAppointmentInput::new().with_interviewer(f.bia.id).with_time(t(10, 0)))
            .await
            .unwrap();
        assert_eq!(moved.interviewer_id, f.bia.id);
        assert_eq!(moved.time, t(10, 0));
        assert_eq!(moved.status, AppointmentStatus::Scheduled);

        // Old slot is free again, the new one is not
        let other = CreateAppointmentInput::new(f.cras.id, f.bia.id, monday(), t(10, 0), "José", "11144477735", "11987654321");
        assert!(matches!(f.service.create(&f.desk, other).await, Err(ServiceError::Conflict(_))));
        let old = CreateAppointmentInput::new(f.cras.id, f.ana.id, monday(), t(8, 0), "José", "11144477735", "11987654321");
        assert!(f.service.create(&f.desk, old).await.is_ok());
    }

    #[tokio::test]
    async fn test_reschedule_within_the_same_day() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();

        // Same interviewer, same citizen, same day: only the time changes
        let moved = f
            .service
            .update(&f.desk, a.id, UpdateAppointmentInput::new().with_time(t(9, 0)))
            .await
            .unwrap();
        assert_eq!((moved.interviewer_id, moved.date, moved.time), (f.ana.id, monday(), t(9, 0)));

        let freed = CreateAppointmentInput::new(f.cras.id, f.ana.id, monday(), t(8, 0), "José", "11144477735", "11987654321");
        assert!(f.service.create(&f.desk, freed).await.is_ok());
    }

    #[tokio::test]
    async fn test_edit_without_move_keeps_status() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        f.service.confirm(&f.desk, a.id).await.unwrap();

        let edited = f
            .service
            .update(&f.desk, a.id, UpdateAppointmentInput::new().with_notes("Trazer RG"))
            .await
            .unwrap();
        assert_eq!(edited.status, AppointmentStatus::Confirmed);
        assert_eq!(edited.notes.as_deref(), Some("Trazer RG"));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let f = setup().await;
        let a = f.service.create(&f.desk, input(&f, f.ana.id, t(8, 0))).await.unwrap();
        let mut second = input(&f, f.bia.id, t(8, 30));
        second.citizen_cpf = "11144477735".into();
        f.service.create(&f.desk, second).await.unwrap();

        let filter = AppointmentFilter { citizen_cpf: Some("529.982.247-25".into()), ..Default::default() };
        let page = f.service.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, a.id);

        assert_eq!(f.service.list_for_day(f.cras.id, monday()).await.unwrap().len(), 2);

        f.service.delete(&f.admin, a.id).await.unwrap();
        assert!(matches!(f.service.get(a.id).await, Err(ServiceError::NotFound(_))));
    }
}
