//! Blocked slot model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A slot (or a whole day) an interviewer is unavailable for booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub id: Uuid,
    pub cras_id: Uuid,
    pub interviewer_id: Uuid,
    pub date: NaiveDate,
    /// `None` blocks the whole day
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub reason: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl BlockedSlot {
    pub fn new(
        cras_id: Uuid,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: Option<NaiveTime>,
        reason: String,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cras_id,
            interviewer_id,
            date,
            time,
            reason,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn is_whole_day(&self) -> bool {
        self.time.is_none()
    }

    /// Whether this block covers the given interviewer slot
    pub fn covers(&self, interviewer_id: Uuid, date: NaiveDate, time: NaiveTime) -> bool {
        self.interviewer_id == interviewer_id
            && self.date == date
            && self.time.map_or(true, |t| t == time)
    }
}

/// Input for blocking a slot or a day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockedSlotInput {
    pub cras_id: Uuid,
    pub interviewer_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub reason: String,
}
