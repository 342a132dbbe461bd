use serde::{Deserialize, Serialize};

use super::enums::FoodTiming;
use crate::config::{DEFAULT_WINDOW_END_MINUTES, DEFAULT_WINDOW_START_MINUTES};

/// Installation-wide defaults read by the resolver and materializer.
///
/// Single row per installation; an absent row reads back as `default()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Earliest minute-of-day any dose may be scheduled.
    pub earliest_time_minutes: i32,
    /// Latest minute-of-day any dose may be scheduled.
    pub latest_time_minutes: i32,
    /// Length of each intake event.
    pub event_duration_minutes: i32,
    /// Reminder lead time shown in event descriptions (0 disables the line).
    pub reminder_minutes: i32,
    /// Fallback food timing when a prescription is Neutral.
    pub food_timing_default: FoodTiming,
    /// Default preferred-time labels for new schedules.
    pub preferred_times: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            earliest_time_minutes: DEFAULT_WINDOW_START_MINUTES,
            latest_time_minutes: DEFAULT_WINDOW_END_MINUTES,
            event_duration_minutes: 30,
            reminder_minutes: 15,
            food_timing_default: FoodTiming::Neutral,
            preferred_times: Vec::new(),
        }
    }
}
