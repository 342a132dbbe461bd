//! Window and food-timing resolution — merges prescription intent with the
//! user's installation-wide bounds.

use crate::models::{FoodTiming, Schedule, UserSettings};

/// Resolve the dosing window for one day.
///
/// A prescription that specified its own window is honored but clamped to
/// the user's outer bounds; a prescription that said nothing inherits the
/// user's bounds directly, unclamped.
pub fn resolve_window(schedule: &Schedule, settings: &UserSettings) -> (i32, i32) {
    if schedule.window_specified {
        (
            schedule.start_time_minutes.max(settings.earliest_time_minutes),
            schedule.end_time_minutes.min(settings.latest_time_minutes),
        )
    } else {
        (settings.earliest_time_minutes, settings.latest_time_minutes)
    }
}

/// Food timing for descriptive text: a Neutral prescription falls back to
/// the user's default. Event timestamps are never affected.
pub fn resolve_food_timing(schedule: &Schedule, settings: &UserSettings) -> FoodTiming {
    if schedule.food_timing == FoodTiming::Neutral {
        settings.food_timing_default
    } else {
        schedule.food_timing
    }
}
