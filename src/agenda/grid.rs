//! Daily slot grid
//!
//! The fixed list of slot start times every interviewer works with,
//! plus the weekdays the units are open.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use super::AgendaError;
use crate::config::AgendaConfig;

/// Upper bound on slots per day
pub const MAX_SLOTS_PER_DAY: usize = 48;

/// Ordered, non-overlapping daily slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotGrid {
    slots: Vec<NaiveTime>,
    slot_minutes: u32,
    working_days: Vec<Weekday>,
}

impl SlotGrid {
    /// Build a grid, rejecting empty, unsorted or overlapping slot lists
    pub fn new(
        slots: Vec<NaiveTime>,
        slot_minutes: u32,
        working_days: Vec<Weekday>,
    ) -> Result<Self, AgendaError> {
        if slots.is_empty() {
            return Err(AgendaError::InvalidGrid("no slots configured".to_string()));
        }
        if slots.len() > MAX_SLOTS_PER_DAY {
            return Err(AgendaError::InvalidGrid(format!(
                "{} slots configured, at most {} allowed",
                slots.len(),
                MAX_SLOTS_PER_DAY
            )));
        }
        if slot_minutes == 0 {
            return Err(AgendaError::InvalidGrid("slot length must be positive".to_string()));
        }

        let length = Duration::minutes(slot_minutes as i64);
        for pair in slots.windows(2) {
            if pair[1] <= pair[0] {
                return Err(AgendaError::InvalidGrid(format!(
                    "slots must be strictly increasing: {} then {}",
                    pair[0].format("%H:%M"),
                    pair[1].format("%H:%M")
                )));
            }
            if pair[0] + length > pair[1] {
                return Err(AgendaError::InvalidGrid(format!(
                    "slot {} overlaps slot {}",
                    pair[0].format("%H:%M"),
                    pair[1].format("%H:%M")
                )));
            }
        }
        if let Some(last) = slots.last() {
            let (_, wrapped) = last.overflowing_add_signed(length);
            if wrapped != 0 {
                return Err(AgendaError::InvalidGrid(format!(
                    "slot {} runs past midnight",
                    last.format("%H:%M")
                )));
            }
        }

        let mut working_days = working_days;
        working_days.sort_by_key(|d| d.num_days_from_monday());
        working_days.dedup();

        Ok(Self {
            slots,
            slot_minutes,
            working_days,
        })
    }

    /// Build the grid described by the agenda configuration
    pub fn from_config(config: &AgendaConfig) -> Result<Self, AgendaError> {
        let slots = config
            .slots
            .iter()
            .map(|s| parse_slot_time(s))
            .collect::<Result<Vec<_>, _>>()?;
        let days = config
            .working_days
            .iter()
            .map(|d| parse_weekday(d))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slots, config.slot_minutes, days)
    }

    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    /// Whether `time` is the start of one of the slots
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.slots.binary_search(&time).is_ok()
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday())
    }

    /// End time of the slot starting at `time`
    pub fn slot_end(&self, time: NaiveTime) -> NaiveTime {
        time + Duration::minutes(self.slot_minutes as i64)
    }
}

/// Parse "HH:MM" (or "HH:MM:SS")
pub fn parse_slot_time(value: &str) -> Result<NaiveTime, AgendaError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AgendaError::InvalidTime(value.to_string()))
}

/// Parse a weekday name in English or Portuguese, full or abbreviated
pub fn parse_weekday(value: &str) -> Result<Weekday, AgendaError> {
    let day = match value.trim().to_lowercase().as_str() {
        "mon" | "monday" | "seg" | "segunda" => Weekday::Mon,
        "tue" | "tuesday" | "ter" | "terca" | "terça" => Weekday::Tue,
        "wed" | "wednesday" | "qua" | "quarta" => Weekday::Wed,
        "thu" | "thursday" | "qui" | "quinta" => Weekday::Thu,
        "fri" | "friday" | "sex" | "sexta" => Weekday::Fri,
        "sat" | "saturday" | "sab" | "sáb" | "sabado" | "sábado" => Weekday::Sat,
        "sun" | "sunday" | "dom" | "domingo" => Weekday::Sun,
        _ => return Err(AgendaError::InvalidWeekday(value.to_string())),
    };
    Ok(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn weekdays() -> Vec<Weekday> {
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    }

    #[test]
    fn test_default_config_grid() {
        let grid = SlotGrid::from_config(&AgendaConfig::default()).unwrap();
        assert_eq!(grid.len(), 15);
        assert_eq!(grid.slots()[0], t(8, 0));
        assert!(grid.contains(t(13, 0)));
        assert!(!grid.contains(t(12, 0)));
        assert!(!grid.contains(t(8, 15)));
        assert_eq!(grid.slot_end(t(16, 0)), t(16, 30));
    }

    #[test]
    fn test_working_days() {
        let grid = SlotGrid::new(vec![t(8, 0)], 30, weekdays()).unwrap();
        // 2030-03-04 is a Monday
        assert!(grid.is_working_day(NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()));
        assert!(!grid.is_working_day(NaiveDate::from_ymd_opt(2030, 3, 9).unwrap()));
        assert!(!grid.is_working_day(NaiveDate::from_ymd_opt(2030, 3, 10).unwrap()));
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(matches!(SlotGrid::new(vec![], 30, weekdays()), Err(AgendaError::InvalidGrid(_))));
    }

    #[test]
    fn test_rejects_unsorted_and_duplicate_slots() {
        assert!(SlotGrid::new(vec![t(9, 0), t(8, 0)], 30, weekdays()).is_err());
        assert!(SlotGrid::new(vec![t(9, 0), t(9, 0)], 30, weekdays()).is_err());
    }

    #[test]
    fn test_rejects_overlapping_slots() {
        let err = SlotGrid::new(vec![t(8, 0), t(8, 30)], 45, weekdays()).unwrap_err();
        assert!(err.to_string().contains("overlaps"));
        assert!(SlotGrid::new(vec![t(8, 0), t(8, 45)], 45, weekdays()).is_ok());
    }

    #[test]
    fn test_rejects_slot_past_midnight() {
        assert!(SlotGrid::new(vec![t(23, 45)], 30, weekdays()).is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_slot_time("08:30").unwrap(), t(8, 30));
        assert_eq!(parse_slot_time(" 14:00:00 ").unwrap(), t(14, 0));
        assert!(parse_slot_time("25:00").is_err());
        assert_eq!(parse_weekday("Segunda").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("SAT").unwrap(), Weekday::Sat);
        assert!(parse_weekday("funday").is_err());
    }

    #[test]
    fn test_from_config_reports_bad_entries() {
        let config = AgendaConfig {
            slots: vec!["8h".to_string()],
            ..AgendaConfig::default()
        };
        assert!(matches!(SlotGrid::from_config(&config), Err(AgendaError::InvalidTime(_))));
    }
}
