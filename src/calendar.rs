//! Calendar mirroring — a best-effort sink, never authoritative.
//!
//! Failures are logged per event and do not block prescription
//! persistence; the reminder pipeline works the same with or without a
//! calendar behind this trait.

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::event::{get_events_by_prescription, update_calendar_event_id};
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Calendar provider rejected the event: {0}")]
    Rejected(String),

    #[error("Calendar unavailable: {0}")]
    Unavailable(String),
}

pub trait CalendarMirror: Send + Sync {
    /// Insert one event into the external calendar, returning its id there.
    fn insert_event(
        &self,
        title: &str,
        description: &str,
        start_millis: i64,
        end_millis: i64,
        calendar_id: i64,
    ) -> Result<i64, CalendarError>;
}

/// Mirror every not-yet-synced event of a prescription into the calendar.
/// Returns how many events were mirrored; per-event failures are logged
/// and skipped.
pub fn sync_events_to_calendar(
    conn: &Connection,
    mirror: &dyn CalendarMirror,
    prescription_id: &Uuid,
    calendar_id: i64,
) -> Result<u32, DatabaseError> {
    let events = get_events_by_prescription(conn, prescription_id)?;

    let mut synced = 0;
    for event in events {
        if event.calendar_event_id.is_some() {
            continue;
        }
        match mirror.insert_event(
            &event.title,
            &event.description,
            event.start_time_millis,
            event.end_time_millis,
            calendar_id,
        ) {
            Ok(external_id) => {
                update_calendar_event_id(conn, &event.id, external_id)?;
                synced += 1;
            }
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Calendar sync skipped event");
            }
        }
    }
    Ok(synced)
}
