use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{FoodTiming, UserSettings};

/// Load the singleton settings row. An absent row reads as defaults — new
/// installations never fail here.
pub fn get_settings(conn: &Connection) -> Result<UserSettings, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT earliest_time_minutes, latest_time_minutes, event_duration_minutes,
         reminder_minutes, food_timing_default, preferred_times
         FROM user_settings WHERE id = 1",
    )?;

    let mut rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i32>(0)?,
            row.get::<_, i32>(1)?,
            row.get::<_, i32>(2)?,
            row.get::<_, i32>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    match rows.next() {
        Some(row) => {
            let (earliest, latest, duration, reminder, food_timing, preferred) = row?;
            let preferred_times: Vec<String> = serde_json::from_str(&preferred)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
            Ok(UserSettings {
                earliest_time_minutes: earliest,
                latest_time_minutes: latest,
                event_duration_minutes: duration,
                reminder_minutes: reminder,
                food_timing_default: FoodTiming::from_str(&food_timing)?,
                preferred_times,
            })
        }
        None => Ok(UserSettings::default()),
    }
}

/// Persist the whole settings object (insert-or-replace on the fixed row).
pub fn save_settings(conn: &Connection, settings: &UserSettings) -> Result<(), DatabaseError> {
    let preferred = serde_json::to_string(&settings.preferred_times)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO user_settings
         (id, earliest_time_minutes, latest_time_minutes, event_duration_minutes,
          reminder_minutes, food_timing_default, preferred_times)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            settings.earliest_time_minutes,
            settings.latest_time_minutes,
            settings.event_duration_minutes,
            settings.reminder_minutes,
            settings.food_timing_default.as_str(),
            preferred,
        ],
    )?;
    Ok(())
}
