//! Agenda service
//!
//! Loads the records an agenda view needs from the store and hands them to
//! the pure builders in [`crate::agenda`]. Single-day interviewer agendas are
//! cached under `agenda:{interviewer}:{date}`; every mutation of an
//! appointment or block must call [`AgendaService::invalidate`] for each
//! interviewer/date it touched.
//!
//! The service also owns the booking lock. Appointment and block mutations
//! take it around their availability check and write so two requests cannot
//! claim the same slot.

use crate::agenda::{
    build_day_agenda, build_interviewer_range, build_reception_agenda, local_now, next_free_slot, slot_state,
    DayAgenda, SlotGrid, SlotState, MAX_RANGE_DAYS,
};
use crate::cache::{CacheLayer, MemoryCache};
use crate::config::AgendaConfig;
use crate::db::Store;
use crate::models::{User, UserRole};
use crate::services::ServiceError;
use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// One interviewer column of the reception view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewerAgenda {
    pub interviewer_id: Uuid,
    pub interviewer_name: String,
    pub agenda: DayAgenda,
}

/// Every active interviewer of a unit for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionAgenda {
    pub cras_id: Uuid,
    pub date: NaiveDate,
    pub interviewers: Vec<InterviewerAgenda>,
}

pub struct AgendaService {
    store: Store,
    grid: Arc<SlotGrid>,
    cache: Arc<MemoryCache>,
    utc_offset_hours: i32,
    search_horizon_days: u32,
    allow_past_booking: bool,
    booking_lock: Mutex<()>,
}

fn cache_key(interviewer_id: Uuid, date: NaiveDate) -> String {
    format!("agenda:{}:{}", interviewer_id, date)
}

impl AgendaService {
    pub fn new(store: Store, grid: Arc<SlotGrid>, cache: Arc<MemoryCache>, config: &AgendaConfig) -> Self {
        Self {
            store,
            grid,
            cache,
            utc_offset_hours: config.utc_offset_hours,
            search_horizon_days: config.search_horizon_days,
            allow_past_booking: config.allow_past_booking,
            booking_lock: Mutex::new(()),
        }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Hold while checking and writing slot occupancy
    pub async fn lock_slots(&self) -> MutexGuard<'_, ()> {
        self.booking_lock.lock().await
    }

    /// Current local time of the units
    pub fn now(&self) -> Result<NaiveDateTime, ServiceError> {
        Ok(local_now(self.utc_offset_hours)?)
    }

    pub fn today(&self) -> Result<NaiveDate, ServiceError> {
        Ok(self.now()?.date())
    }

    /// Agenda of one interviewer for one day
    pub async fn interviewer_day(&self, interviewer_id: Uuid, date: NaiveDate) -> Result<DayAgenda, ServiceError> {
        let key = cache_key(interviewer_id, date);
        match self.cache.get::<DayAgenda>(&key).await {
            Ok(Some(agenda)) => return Ok(agenda),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read cached agenda {}: {}", key, e),
        }

        self.interviewer(interviewer_id).await?;

        // Writers invalidate while holding the lock, so a build made under it
        // can never be cached after an invalidation it missed
        let _guard = self.lock_slots().await;
        let appointments = self
            .store
            .appointments
            .list_for_interviewer(interviewer_id, date, date)
            .await
            .context("Failed to load appointments")?;
        let blocks = self
            .store
            .blocked_slots
            .list_for_interviewer(interviewer_id, date, date)
            .await
            .context("Failed to load blocked slots")?;

        let agenda = build_day_agenda(&self.grid, interviewer_id, date, &appointments, &blocks, self.now()?);
        if let Err(e) = self.cache.set(&key, &agenda).await {
            tracing::warn!("Failed to cache agenda {}: {}", key, e);
        }
        Ok(agenda)
    }

    /// Reception view: every active interviewer of the unit, ordered by name
    pub async fn reception_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<ReceptionAgenda, ServiceError> {
        self.store
            .cras
            .get_by_id(cras_id)
            .await
            .context("Failed to get CRAS")?
            .ok_or_else(|| ServiceError::not_found(format!("CRAS {}", cras_id)))?;

        let interviewers: Vec<User> = self
            .store
            .users
            .list_by_cras_and_role(cras_id, UserRole::Entrevistador)
            .await
            .context("Failed to list interviewers")?
            .into_iter()
            .filter(|u| u.active)
            .collect();
        let appointments = self
            .store
            .appointments
            .list_for_cras_day(cras_id, date)
            .await
            .context("Failed to load appointments")?;
        let blocks = self
            .store
            .blocked_slots
            .list_for_cras_day(cras_id, date)
            .await
            .context("Failed to load blocked slots")?;

        let ids: Vec<Uuid> = interviewers.iter().map(|u| u.id).collect();
        let agendas = build_reception_agenda(&self.grid, date, &ids, &appointments, &blocks, self.now()?);

        let interviewers = interviewers
            .into_iter()
            .zip(agendas)
            .map(|(user, agenda)| InterviewerAgenda {
                interviewer_id: user.id,
                interviewer_name: user.name,
                agenda,
            })
            .collect();

        Ok(ReceptionAgenda {
            cras_id,
            date,
            interviewers,
        })
    }

    /// One interviewer's agenda for every day of `from..=to`
    pub async fn my_agenda(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayAgenda>, ServiceError> {
        if from > to {
            return Err(ServiceError::validation("Start date is after end date"));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(ServiceError::validation(format!(
                "Date range is limited to {} days",
                MAX_RANGE_DAYS
            )));
        }
        self.interviewer(interviewer_id).await?;

        let appointments = self
            .store
            .appointments
            .list_for_interviewer(interviewer_id, from, to)
            .await
            .context("Failed to load appointments")?;
        let blocks = self
            .store
            .blocked_slots
            .list_for_interviewer(interviewer_id, from, to)
            .await
            .context("Failed to load blocked slots")?;

        Ok(build_interviewer_range(
            &self.grid,
            interviewer_id,
            from,
            to,
            &appointments,
            &blocks,
            self.now()?,
        ))
    }

    /// Earliest free slot on or after `from` (today when omitted)
    pub async fn next_available(
        &self,
        interviewer_id: Uuid,
        from: Option<NaiveDate>,
    ) -> Result<Option<(NaiveDate, NaiveTime)>, ServiceError> {
        self.interviewer(interviewer_id).await?;
        let now = self.now()?;
        let from = from.map_or(now.date(), |d| d.max(now.date()));
        let to = from
            .checked_add_signed(Duration::days(self.search_horizon_days as i64))
            .ok_or_else(|| ServiceError::validation(format!("No agenda past {}", from)))?;

        let appointments = self
            .store
            .appointments
            .list_for_interviewer(interviewer_id, from, to)
            .await
            .context("Failed to load appointments")?;
        let blocks = self
            .store
            .blocked_slots
            .list_for_interviewer(interviewer_id, from, to)
            .await
            .context("Failed to load blocked slots")?;

        Ok(next_free_slot(
            &self.grid,
            interviewer_id,
            from,
            self.search_horizon_days,
            &appointments,
            &blocks,
            now,
        ))
    }

    /// Check that a slot can take a new booking.
    ///
    /// `ignore` excludes one appointment from the check, so a rescheduled
    /// appointment does not collide with itself. Callers must hold
    /// [`lock_slots`](Self::lock_slots).
    pub async fn ensure_bookable(
        &self,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        ignore: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let appointments: Vec<_> = self
            .store
            .appointments
            .list_for_interviewer(interviewer_id, date, date)
            .await
            .context("Failed to load appointments")?
            .into_iter()
            .filter(|a| Some(a.id) != ignore)
            .collect();
        let blocks = self
            .store
            .blocked_slots
            .list_for_interviewer(interviewer_id, date, date)
            .await
            .context("Failed to load blocked slots")?;

        let now = if self.allow_past_booking {
            NaiveDateTime::MIN
        } else {
            self.now()?
        };

        match slot_state(&self.grid, interviewer_id, date, time, &appointments, &blocks, now) {
            None => Err(ServiceError::validation(format!("{} is not a slot of the agenda", time.format("%H:%M")))),
            Some(SlotState::Free) => Ok(()),
            Some(SlotState::Closed) => Err(ServiceError::validation(format!("{} is not a working day", date))),
            Some(SlotState::Past) => Err(ServiceError::validation("The slot has already started")),
            Some(SlotState::Booked { .. }) => Err(ServiceError::conflict("The slot is already booked")),
            Some(SlotState::Blocked { reason }) if reason.is_empty() => {
                Err(ServiceError::conflict("The slot is blocked"))
            }
            Some(SlotState::Blocked { reason }) => {
                Err(ServiceError::conflict(format!("The slot is blocked: {}", reason)))
            }
        }
    }

    /// Drop the cached agenda of one interviewer and day
    pub async fn invalidate(&self, interviewer_id: Uuid, date: NaiveDate) {
        let key = cache_key(interviewer_id, date);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!("Failed to invalidate agenda {}: {}", key, e);
        }
    }

    /// Drop every cached agenda of one interviewer
    pub async fn invalidate_interviewer(&self, interviewer_id: Uuid) {
        let pattern = format!("agenda:{}:*", interviewer_id);
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!("Failed to invalidate agendas {}: {}", pattern, e);
        }
    }

    async fn interviewer(&self, id: Uuid) -> Result<User, ServiceError> {
        let user = self
            .store
            .users
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found(format!("Interviewer {}", id)))?;
        if !user.is_interviewer() {
            return Err(ServiceError::validation(format!("{} is not an interviewer", user.name)));
        }
        if !user.active {
            return Err(ServiceError::validation(format!("{} is no longer active", user.name)));
        }
        Ok(user)
    }
}
