//! Slot availability
//!
//! Pure functions that lay appointments and blocked slots over the daily
//! slot grid. Every agenda view is built here:
//! - one interviewer, one day
//! - every interviewer of a unit, one day (reception view)
//! - one interviewer over a date range ("my agenda")
//! - the next free slot of an interviewer
//!
//! Slot state precedence, strongest first: `Closed` (not a working day),
//! `Booked` (an active appointment), `Blocked`, `Past`, `Free`.
//! Cancelled appointments never occupy a slot.

mod grid;

pub use grid::{parse_slot_time, parse_weekday, SlotGrid, MAX_SLOTS_PER_DAY};

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, BlockedSlot};

/// Longest date range a single range query will expand
pub const MAX_RANGE_DAYS: i64 = 62;

/// Errors raised while building the slot grid
#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    #[error("Invalid slot grid: {0}")]
    InvalidGrid(String),
    #[error("Invalid slot time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("Invalid weekday '{0}'")]
    InvalidWeekday(String),
    #[error("Invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}

/// State of a single slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    Free,
    Booked {
        appointment_id: Uuid,
        citizen_name: String,
        status: AppointmentStatus,
    },
    Blocked {
        reason: String,
    },
    /// Already started, nothing booked
    Past,
    /// The unit does not open on this weekday
    Closed,
}

impl SlotState {
    pub fn is_free(&self) -> bool {
        matches!(self, SlotState::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlot {
    pub time: NaiveTime,
    #[serde(flatten)]
    pub state: SlotState,
}

/// Counts of slot states in one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaSummary {
    pub free: usize,
    pub booked: usize,
    pub blocked: usize,
    pub past: usize,
    pub closed: usize,
}

/// One interviewer's slots for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAgenda {
    pub interviewer_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<DaySlot>,
}

impl DayAgenda {
    pub fn free_slots(&self) -> Vec<NaiveTime> {
        self.slots
            .iter()
            .filter(|s| s.state.is_free())
            .map(|s| s.time)
            .collect()
    }

    /// No free slot left
    pub fn is_full(&self) -> bool {
        !self.slots.iter().any(|s| s.state.is_free())
    }

    pub fn summary(&self) -> AgendaSummary {
        let mut summary = AgendaSummary::default();
        for slot in &self.slots {
            match slot.state {
                SlotState::Free => summary.free += 1,
                SlotState::Booked { .. } => summary.booked += 1,
                SlotState::Blocked { .. } => summary.blocked += 1,
                SlotState::Past => summary.past += 1,
                SlotState::Closed => summary.closed += 1,
            }
        }
        summary
    }

    pub fn slot(&self, time: NaiveTime) -> Option<&DaySlot> {
        self.slots.iter().find(|s| s.time == time)
    }
}

/// Current local wall-clock time of the units
pub fn local_now(utc_offset_hours: i32) -> Result<NaiveDateTime, AgendaError> {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .ok_or(AgendaError::InvalidOffset(utc_offset_hours))?;
    Ok(Utc::now().with_timezone(&offset).naive_local())
}

fn compute_state(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> SlotState {
    if !grid.is_working_day(date) {
        return SlotState::Closed;
    }
    if let Some(a) = appointments
        .iter()
        .find(|a| a.occupies(interviewer_id, date, time))
    {
        return SlotState::Booked {
            appointment_id: a.id,
            citizen_name: a.citizen_name.clone(),
            status: a.status,
        };
    }
    // Whole-day blocks win over single-slot blocks for the reason shown
    let block = blocks
        .iter()
        .filter(|b| b.covers(interviewer_id, date, time))
        .min_by_key(|b| b.time.is_some());
    if let Some(b) = block {
        return SlotState::Blocked {
            reason: b.reason.clone(),
        };
    }
    if NaiveDateTime::new(date, time) <= now {
        return SlotState::Past;
    }
    SlotState::Free
}

/// State of one slot, or None when `time` is not a slot of the grid
pub fn slot_state(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> Option<SlotState> {
    if !grid.contains(time) {
        return None;
    }
    Some(compute_state(grid, interviewer_id, date, time, appointments, blocks, now))
}

/// Whether the slot exists and is free
pub fn is_slot_available(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> bool {
    slot_state(grid, interviewer_id, date, time, appointments, blocks, now)
        .is_some_and(|s| s.is_free())
}

/// Build one interviewer's agenda for one day.
///
/// Records of other interviewers or dates are ignored, so callers may pass
/// wider slices than needed.
pub fn build_day_agenda(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    date: NaiveDate,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> DayAgenda {
    let slots = grid
        .slots()
        .iter()
        .map(|&time| DaySlot {
            time,
            state: compute_state(grid, interviewer_id, date, time, appointments, blocks, now),
        })
        .collect();

    DayAgenda {
        interviewer_id,
        date,
        slots,
    }
}

/// Build the reception view: one agenda per interviewer, in the given order
pub fn build_reception_agenda(
    grid: &SlotGrid,
    date: NaiveDate,
    interviewer_ids: &[Uuid],
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> Vec<DayAgenda> {
    interviewer_ids
        .iter()
        .map(|&id| build_day_agenda(grid, id, date, appointments, blocks, now))
        .collect()
}

/// Build one agenda per day of the inclusive range `from..=to`.
///
/// Returns an empty list when `from > to`; ranges longer than
/// `MAX_RANGE_DAYS` are cut at that length.
pub fn build_interviewer_range(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> Vec<DayAgenda> {
    if from > to {
        return Vec::new();
    }
    let days = (to - from).num_days().min(MAX_RANGE_DAYS - 1);
    (0..=days)
        .filter_map(|offset| from.checked_add_signed(Duration::days(offset)))
        .map(|date| build_day_agenda(grid, interviewer_id, date, appointments, blocks, now))
        .collect()
}

/// Earliest free slot from `from` onwards, looking `horizon_days` days ahead
pub fn next_free_slot(
    grid: &SlotGrid,
    interviewer_id: Uuid,
    from: NaiveDate,
    horizon_days: u32,
    appointments: &[Appointment],
    blocks: &[BlockedSlot],
    now: NaiveDateTime,
) -> Option<(NaiveDate, NaiveTime)> {
    for offset in 0..horizon_days as i64 {
        let date = from.checked_add_signed(Duration::days(offset))?;
        if !grid.is_working_day(date) {
            continue;
        }
        for &time in grid.slots() {
            if compute_state(grid, interviewer_id, date, time, appointments, blocks, now).is_free() {
                return Some((date, time));
            }
        }
    }
    None
}
