//! Appointment model
//!
//! This module provides:
//! - `Appointment` entity: one citizen booked into one interviewer slot
//! - `AppointmentStatus` and its transition table
//! - Input types for creating and updating appointments
//! - `AppointmentFilter` for list queries

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Appointment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub cras_id: Uuid,
    /// Interviewer (entrevistador) who owns the slot
    pub interviewer_id: Uuid,
    /// Local calendar date of the slot
    pub date: NaiveDate,
    /// Local start time of the slot
    pub time: NaiveTime,
    pub citizen_name: String,
    /// CPF as 11 digits, without punctuation
    pub citizen_cpf: String,
    /// Phone as digits only, area code included
    pub citizen_phone: String,
    /// Reason for the visit
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    /// User who booked the appointment
    pub created_by: Uuid,
    /// User who last changed the appointment
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a new scheduled appointment. CPF and phone must already be normalized.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cras_id: Uuid,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        citizen_name: String,
        citizen_cpf: String,
        citizen_phone: String,
        reason: String,
        created_by: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            cras_id,
            interviewer_id,
            date,
            time,
            citizen_name,
            citizen_cpf,
            citizen_phone,
            reason,
            notes: None,
            status: AppointmentStatus::Scheduled,
            cancel_reason: None,
            created_by,
            updated_by: created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this appointment holds its slot
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether this appointment sits in the given interviewer/date/time slot
    pub fn occupies(&self, interviewer_id: Uuid, date: NaiveDate, time: NaiveTime) -> bool {
        self.is_active()
            && self.interviewer_id == interviewer_id
            && self.date == date
            && self.time == time
    }
}

/// Appointment lifecycle status.
///
/// Wire names are the Portuguese values stored by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    /// Booked, waiting for the citizen
    #[serde(rename = "agendado")]
    Scheduled,
    /// Citizen confirmed attendance
    #[serde(rename = "confirmado")]
    Confirmed,
    /// Interview took place
    #[serde(rename = "realizado")]
    Completed,
    /// Citizen did not show up
    #[serde(rename = "ausente")]
    Missed,
    /// Cancelled; the slot is free again
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "agendado",
            AppointmentStatus::Confirmed => "confirmado",
            AppointmentStatus::Completed => "realizado",
            AppointmentStatus::Missed => "ausente",
            AppointmentStatus::Cancelled => "cancelado",
        }
    }

    /// Every status except `Cancelled` keeps the slot occupied
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Editable appointments can still be rescheduled or have their data changed
    pub fn is_editable(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_editable()
    }

    /// Check the transition table
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed)
                | (Scheduled, Cancelled)
                | (Scheduled, Missed)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, Missed)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "agendado" | "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmado" | "confirmed" => Ok(AppointmentStatus::Confirmed),
            "realizado" | "completed" => Ok(AppointmentStatus::Completed),
            "ausente" | "missed" => Ok(AppointmentStatus::Missed),
            "cancelado" | "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid appointment status: {}", s)),
        }
    }
}

/// Input for booking a new appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentInput {
    pub cras_id: Uuid,
    pub interviewer_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub citizen_name: String,
    /// CPF, with or without punctuation
    pub citizen_cpf: String,
    /// Phone, with or without punctuation
    pub citizen_phone: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateAppointmentInput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cras_id: Uuid,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        citizen_name: impl Into<String>,
        citizen_cpf: impl Into<String>,
        citizen_phone: impl Into<String>,
    ) -> Self {
        Self {
            cras_id,
            interviewer_id,
            date,
            time,
            citizen_name: citizen_name.into(),
            citizen_cpf: citizen_cpf.into(),
            citizen_phone: citizen_phone.into(),
            reason: String::new(),
            notes: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Input for editing an existing appointment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentInput {
    pub interviewer_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub citizen_name: Option<String>,
    pub citizen_cpf: Option<String>,
    pub citizen_phone: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl UpdateAppointmentInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interviewer(mut self, interviewer_id: Uuid) -> Self {
        self.interviewer_id = Some(interviewer_id);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_citizen_phone(mut self, phone: impl Into<String>) -> Self {
        self.citizen_phone = Some(phone.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.interviewer_id.is_some()
            || self.date.is_some()
            || self.time.is_some()
            || self.citizen_name.is_some()
            || self.citizen_cpf.is_some()
            || self.citizen_phone.is_some()
            || self.reason.is_some()
            || self.notes.is_some()
    }

    /// Whether the change moves the appointment to another slot
    pub fn reschedules(&self) -> bool {
        self.interviewer_id.is_some() || self.date.is_some() || self.time.is_some()
    }
}

/// Filter for appointment listings. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub cras_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    /// Inclusive lower bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    /// Digits only
    pub citizen_cpf: Option<String>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.cras_id.map_or(true, |id| appointment.cras_id == id)
            && self.interviewer_id.map_or(true, |id| appointment.interviewer_id == id)
            && self.from.map_or(true, |d| appointment.date >= d)
            && self.to.map_or(true, |d| appointment.date <= d)
            && self.status.map_or(true, |s| appointment.status == s)
            && self
                .citizen_cpf
                .as_deref()
                .map_or(true, |cpf| appointment.citizen_cpf == cpf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    fn sample() -> Appointment {
        Appointment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2030, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            "João da Silva".to_string(),
            "52998224725".to_string(),
            "11987654321".to_string(),
            "Cadastro Único".to_string(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_new_appointment_is_scheduled() {
        let a = sample();
        assert_eq!(a.status, Scheduled);
        assert_eq!(a.created_by, a.updated_by);
        assert!(a.is_active());
    }

    #[test]
    fn test_transition_table() {
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(Scheduled.can_transition_to(Missed));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Scheduled));
        for terminal in [Completed, Missed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Scheduled, Confirmed, Completed, Missed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_cancelled_does_not_occupy() {
        let mut a = sample();
        assert!(a.occupies(a.interviewer_id, a.date, a.time));
        a.status = Cancelled;
        assert!(!a.occupies(a.interviewer_id, a.date, a.time));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&Confirmed).unwrap(), "\"confirmado\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(parsed, Cancelled);
        assert_eq!(AppointmentStatus::from_str("REALIZADO").unwrap(), Completed);
        assert!(AppointmentStatus::from_str("pendente").is_err());
    }

    #[test]
    fn test_filter_matches() {
        let a = sample();
        let all = AppointmentFilter::default();
        assert!(all.matches(&a));

        let by_range = AppointmentFilter {
            from: NaiveDate::from_ymd_opt(2030, 3, 1),
            to: NaiveDate::from_ymd_opt(2030, 3, 4),
            ..Default::default()
        };
        assert!(by_range.matches(&a));

        let by_cpf = AppointmentFilter {
            citizen_cpf: Some("11111111111".to_string()),
            ..Default::default()
        };
        assert!(!by_cpf.matches(&a));

        let by_status = AppointmentFilter {
            status: Some(Cancelled),
            ..Default::default()
        };
        assert!(!by_status.matches(&a));
    }

    #[test]
    fn test_update_input_reschedules() {
        assert!(!UpdateAppointmentInput::new().has_changes());
        let notes_only = UpdateAppointmentInput::new().with_notes("trazer documentos");
        assert!(notes_only.has_changes());
        assert!(!notes_only.reschedules());
        let moved = UpdateAppointmentInput::new().with_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert!(moved.reschedules());
    }
}
