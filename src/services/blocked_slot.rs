//! Blocked slot service
//!
//! Interviewers block their own slots (meetings, home visits, leave); admins
//! may block anyone's. A block with no time closes the whole day.

use crate::db::repositories::{AppointmentRepository, BlockedSlotRepository, UserRepository};
use crate::models::{BlockedSlot, CreateBlockedSlotInput, EntityKind, LogAction, User};
use crate::services::agenda::AgendaService;
use crate::services::audit::AuditService;
use crate::services::ServiceError;
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct BlockedSlotService {
    repo: Arc<dyn BlockedSlotRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    users: Arc<dyn UserRepository>,
    agenda: Arc<AgendaService>,
    audit: Arc<AuditService>,
}

impl BlockedSlotService {
    pub fn new(
        repo: Arc<dyn BlockedSlotRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        users: Arc<dyn UserRepository>,
        agenda: Arc<AgendaService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            repo,
            appointments,
            users,
            agenda,
            audit,
        }
    }

    pub async fn block(&self, actor: &User, input: CreateBlockedSlotInput) -> Result<BlockedSlot, ServiceError> {
        require_owner(actor, input.interviewer_id)?;

        let interviewer = self
            .users
            .get_by_id(input.interviewer_id)
            .await
            .context("Failed to get interviewer")?
            .ok_or_else(|| ServiceError::not_found(format!("Interviewer {}", input.interviewer_id)))?;
        if !interviewer.is_interviewer() || interviewer.cras_id != Some(input.cras_id) {
            return Err(ServiceError::validation(format!(
                "{} is not an interviewer of this CRAS",
                interviewer.name
            )));
        }
        if let Some(time) = input.time {
            if !self.agenda.grid().contains(time) {
                return Err(ServiceError::validation(format!(
                    "{} is not a slot of the agenda",
                    time.format("%H:%M")
                )));
            }
        }

        let _guard = self.agenda.lock_slots().await;

        let existing = self
            .repo
            .list_for_interviewer(input.interviewer_id, input.date, input.date)
            .await
            .context("Failed to load blocked slots")?;
        let duplicate = existing.iter().any(|b| b.is_whole_day() || b.time == input.time);
        if duplicate {
            return Err(ServiceError::conflict("The slot is already blocked"));
        }

        let booked = match input.time {
            Some(time) => self
                .appointments
                .find_active_in_slot(input.interviewer_id, input.date, time)
                .await
                .context("Failed to load appointments")?,
            None => self
                .appointments
                .list_for_interviewer(input.interviewer_id, input.date, input.date)
                .await
                .context("Failed to load appointments")?
                .into_iter()
                .find(|a| a.is_active()),
        };
        if let Some(a) = booked {
            return Err(ServiceError::conflict(format!(
                "{} has an appointment at {}; reschedule or cancel it first",
                interviewer.name,
                a.time.format("%H:%M")
            )));
        }

        let block = BlockedSlot::new(
            input.cras_id,
            input.interviewer_id,
            input.date,
            input.time,
            input.reason.trim().to_string(),
            actor.id,
        );
        let saved = self.repo.create(&block).await.context("Failed to create blocked slot")?;
        self.agenda.invalidate(saved.interviewer_id, saved.date).await;

        self.audit
            .record(
                actor.id,
                LogAction::Block,
                EntityKind::BlockedSlot,
                saved.id,
                json!({
                    "interviewer_id": saved.interviewer_id,
                    "date": saved.date,
                    "time": saved.time,
                    "reason": saved.reason,
                }),
            )
            .await?;
        tracing::info!(
            actor = %actor.id,
            interviewer_id = %saved.interviewer_id,
            date = %saved.date,
            whole_day = saved.is_whole_day(),
            "Slot blocked"
        );
        Ok(saved)
    }

    pub async fn unblock(&self, actor: &User, id: Uuid) -> Result<(), ServiceError> {
        let _guard = self.agenda.lock_slots().await;
        let block = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get blocked slot")?
            .ok_or_else(|| ServiceError::not_found(format!("Blocked slot {}", id)))?;
        require_owner(actor, block.interviewer_id)?;

        self.repo.delete(id).await.context("Failed to delete blocked slot")?;
        self.agenda.invalidate(block.interviewer_id, block.date).await;

        self.audit
            .record(
                actor.id,
                LogAction::Unblock,
                EntityKind::BlockedSlot,
                id,
                json!({ "interviewer_id": block.interviewer_id, "date": block.date, "time": block.time }),
            )
            .await?;
        tracing::info!(actor = %actor.id, blocked_slot_id = %id, "Slot unblocked");
        Ok(())
    }

    pub async fn list(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, ServiceError> {
        if from > to {
            return Err(ServiceError::validation("Start date is after end date"));
        }
        Ok(self
            .repo
            .list_for_interviewer(interviewer_id, from, to)
            .await
            .context("Failed to list blocked slots")?)
    }
}

/// Admins, or the interviewer whose agenda it is
fn require_owner(actor: &User, interviewer_id: Uuid) -> Result<(), ServiceError> {
    if actor.active && (actor.is_admin() || (actor.is_interviewer() && actor.id == interviewer_id)) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Only the interviewer or an administrator can change blocked slots"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agenda::{SlotGrid, SlotState};
    use crate::config::{AgendaConfig, CacheConfig};
    use crate::db::Store;
    use crate::models::{Appointment, Cras, UserRole};
    use chrono::NaiveTime;

    struct Fixture {
        store: Store,
        agenda: Arc<AgendaService>,
        service: BlockedSlotService,
        cras: Cras,
        admin: User,
        ana: User,
        bia: User,
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn setup() -> Fixture {
        let store = Store::in_memory();
        let cras = Cras::new("CRAS Centro".into(), String::new(), None);
        store.cras.create(&cras).await.unwrap();

        let admin = User::new("Admin".into(), "admin@cras.gov.br".into(), String::new(), UserRole::Admin, None);
        let ana = User::new("Ana".into(), "ana@cras.gov.br".into(), String::new(), UserRole::Entrevistador, Some(cras.id));
        let bia = User::new("Bia".into(), "bia@cras.gov.br".into(), String::new(), UserRole::Entrevistador, Some(cras.id));
        for user in [&admin, &ana, &bia] {
            store.users.create(user).await.unwrap();
        }

        let config = AgendaConfig::default();
        let agenda = Arc::new(AgendaService::new(
            store.clone(),
            Arc::new(SlotGrid::from_config(&config).unwrap()),
            crate::cache::create_cache(&CacheConfig::default()),
            &config,
        ));
        let service = BlockedSlotService::new(
            store.blocked_slots.clone(),
            store.appointments.clone(),
            store.users.clone(),
            agenda.clone(),
            Arc::new(AuditService::new(store.audit_logs.clone())),
        );

        Fixture { store, agenda, service, cras, admin, ana, bia }
    }

    fn input(f: &Fixture, interviewer: Uuid, time: Option<NaiveTime>) -> CreateBlockedSlotInput {
        CreateBlockedSlotInput {
            cras_id: f.cras.id,
            interviewer_id: interviewer,
            date: monday(),
            time,
            reason: "Visita domiciliar".into(),
        }
    }

    #[tokio::test]
    async fn test_block_shows_in_agenda_and_unblock_restores() {
        let f = setup().await;
        // Prime the cache so the block must invalidate it
        f.agenda.interviewer_day(f.ana.id, monday()).await.unwrap();

        let block = f.service.block(&f.ana, input(&f, f.ana.id, Some(t(9, 0)))).await.unwrap();
        let agenda = f.agenda.interviewer_day(f.ana.id, monday()).await.unwrap();
        assert_eq!(
            agenda.slot(t(9, 0)).unwrap().state,
            SlotState::Blocked { reason: "Visita domiciliar".into() }
        );

        f.service.unblock(&f.ana, block.id).await.unwrap();
        let agenda = f.agenda.interviewer_day(f.ana.id, monday()).await.unwrap();
        assert!(agenda.slot(t(9, 0)).unwrap().state.is_free());
    }

    #[tokio::test]
    async fn test_only_owner_or_admin() {
        let f = setup().await;
        let result = f.service.block(&f.bia, input(&f, f.ana.id, Some(t(9, 0)))).await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
        assert!(f.service.block(&f.admin, input(&f, f.ana.id, Some(t(9, 0)))).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_and_off_grid() {
        let f = setup().await;
        f.service.block(&f.ana, input(&f, f.ana.id, Some(t(9, 0)))).await.unwrap();

        let dup = f.service.block(&f.ana, input(&f, f.ana.id, Some(t(9, 0)))).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let off_grid = f.service.block(&f.ana, input(&f, f.ana.id, Some(t(12, 15)))).await;
        assert!(matches!(off_grid, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_whole_day_blocks_everything_after_it() {
        let f = setup().await;
        f.service.block(&f.ana, input(&f, f.ana.id, None)).await.unwrap();
        let single = f.service.block(&f.ana, input(&f, f.ana.id, Some(t(8, 0)))).await;
        assert!(matches!(single, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_cannot_block_over_appointment() {
        let f = setup().await;
        let appointment = Appointment::new(
            f.cras.id,
            f.ana.id,
            monday(),
            t(14, 0),
            "Jorge".into(),
            "52998224725".into(),
            "11987654321".into(),
            String::new(),
            f.admin.id,
        );
        f.store.appointments.create(&appointment).await.unwrap();

        let slot = f.service.block(&f.ana, input(&f, f.ana.id, Some(t(14, 0)))).await;
        assert!(matches!(slot, Err(ServiceError::Conflict(_))));
        let day = f.service.block(&f.ana, input(&f, f.ana.id, None)).await;
        assert!(matches!(day, Err(ServiceError::Conflict(msg)) if msg.contains("14:00")));
        assert!(f.service.block(&f.ana, input(&f, f.ana.id, Some(t(15, 0)))).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_appointment_does_not_hold_the_slot() {
        let f = setup().await;
        let mut appointment = Appointment::new(
            f.cras.id,
            f.ana.id,
            monday(),
            t(14, 0),
            "Jorge".into(),
            "52998224725".into(),
            "11987654321".into(),
            String::new(),
            f.admin.id,
        );
        appointment.status = crate::models::AppointmentStatus::Cancelled;
        f.store.appointments.create(&appointment).await.unwrap();

        assert!(f.service.block(&f.ana, input(&f, f.ana.id, Some(t(14, 0)))).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_range() {
        let f = setup().await;
        f.service.block(&f.ana, input(&f, f.ana.id, Some(t(9, 0)))).await.unwrap();
        let list = f.service.list(f.ana.id, monday(), monday()).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(f.service.list(f.bia.id, monday(), monday()).await.unwrap().is_empty());
    }
}
