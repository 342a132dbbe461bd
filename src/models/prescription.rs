use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FoodTiming, PrescriptionStatus};
use super::medication::ParsedMedication;
use crate::config::{DEFAULT_WINDOW_END_MINUTES, DEFAULT_WINDOW_START_MINUTES};

/// Dosing schedule embedded in a prescription (not independently persisted).
///
/// `window_specified` records whether the start/end window came from the
/// prescription itself rather than the universal defaults. A parser that
/// explicitly answers 8:00–20:00 is distinguishable from one that said
/// nothing, so the resolver does not have to infer intent from equality
/// with the default constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub times_per_day: i32,
    pub preferred_times: Vec<String>,
    pub food_timing: FoodTiming,
    pub duration_days: i32,
    pub start_time_minutes: i32,
    pub end_time_minutes: i32,
    pub window_specified: bool,
    pub interval_days: i32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            times_per_day: 1,
            preferred_times: vec!["morning".to_string()],
            food_timing: FoodTiming::Neutral,
            duration_days: 7,
            start_time_minutes: DEFAULT_WINDOW_START_MINUTES,
            end_time_minutes: DEFAULT_WINDOW_END_MINUTES,
            window_specified: false,
            interval_days: 1,
        }
    }
}

/// A saved prescription: parsed medications plus the resolved schedule and
/// a start date normalized to UTC midnight.
///
/// Lifecycle is two-state: `Active` courses generate reminders; `Archived`
/// courses keep their event history but are skipped by every delivery
/// mechanism. Hard deletion is a separate `purge` that cascades to events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub title: String,
    pub medications: Vec<ParsedMedication>,
    pub schedule: Schedule,
    pub start_date_millis: i64,
    pub status: PrescriptionStatus,
    pub created_at_millis: i64,
}

impl Prescription {
    pub fn new(
        title: &str,
        medications: Vec<ParsedMedication>,
        schedule: Schedule,
        start_date_millis: i64,
        now_millis: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            medications,
            schedule,
            start_date_millis,
            status: PrescriptionStatus::Active,
            created_at_millis: now_millis,
        }
    }
}
