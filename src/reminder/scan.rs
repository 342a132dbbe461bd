//! The shared "upcoming doses" unit of work run by both the periodic
//! rescan and the foreground monitor.

use rusqlite::Connection;

use crate::config::REMINDER_LOOKAHEAD_MILLIS;
use crate::db::repository::event::{claim_reminder, get_due_unreminded_events};
use crate::db::DatabaseError;

use super::ReminderDispatcher;

/// Find incomplete, unclaimed events starting within the lookahead window
/// and hand each to the exact-alarm mechanism.
///
/// The claim (compare-and-set on `reminder_sent`) happens before alarm
/// registration: when two mechanisms observe the same event, only the
/// claim winner registers, so a double scan schedules at most one alarm
/// per event. A failed registration after a won claim is logged and the
/// system degrades to the remaining delivery paths.
pub fn run_reminder_scan(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    now_millis: i64,
) -> Result<u32, DatabaseError> {
    let due = get_due_unreminded_events(conn, now_millis, now_millis + REMINDER_LOOKAHEAD_MILLIS)?;
    tracing::debug!(count = due.len(), "Reminder scan found upcoming events");

    let mut scheduled = 0;
    for event in due {
        if !claim_reminder(conn, &event.id)? {
            // Another mechanism got here first.
            continue;
        }

        match dispatcher.schedule_at(&event.id, event.start_time_millis) {
            Ok(()) => scheduled += 1,
            Err(e) => {
                tracing::warn!(event_id = %event.id, error = %e, "Alarm registration failed");
            }
        }
    }

    if scheduled > 0 {
        tracing::info!(scheduled, "Reminder scan registered alarms");
    }
    Ok(scheduled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use uuid::Uuid;

    use crate::db::repository::event::insert_events;
    use crate::db::repository::prescription::insert_prescription;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{MedicationEvent, ParsedMedication, Prescription, Schedule};
    use crate::reminder::ReminderError;

    #[derive(Default)]
    struct RecordingDispatcher {
        scheduled: Mutex<Vec<(Uuid, i64)>>,
        fail: bool,
    }

    impl ReminderDispatcher for RecordingDispatcher {
        fn schedule_at(&self, event_id: &Uuid, start: i64) -> Result<(), ReminderError> {
            if self.fail {
                return Err(ReminderError::AlarmRegistration("denied".into()));
            }
            self.scheduled.lock().unwrap().push((*event_id, start));
            Ok(())
        }

        fn cancel(&self, _event_id: &Uuid) -> Result<(), ReminderError> {
            Ok(())
        }
    }

    fn setup_with_events(starts: &[i64]) -> (Connection, Vec<MedicationEvent>) {
        let conn = open_memory_database().unwrap();
        let rx = Prescription::new(
            "Course",
            vec![ParsedMedication::new("MedA", "1 tab", "daily", "7 days")],
            Schedule::default(),
            0,
            0,
        );
        insert_prescription(&conn, &rx).unwrap();

        let events: Vec<MedicationEvent> = starts
            .iter()
            .map(|start| MedicationEvent::new(rx.id, "MedA", "desc", *start, *start + 60_000, 0))
            .collect();
        insert_events(&conn, &events).unwrap();
        (conn, events)
    }

    #[test]
    fn schedules_only_events_inside_lookahead() {
        let now = 1_000_000;
        let (conn, _) = setup_with_events(&[
            now - 60_000,                            // already past
            now + 10 * 60_000,                       // due
            now + REMINDER_LOOKAHEAD_MILLIS,         // boundary, due
            now + REMINDER_LOOKAHEAD_MILLIS + 1_000, // beyond lookahead
        ]);
        let dispatcher = RecordingDispatcher::default();

        let scheduled = run_reminder_scan(&conn, &dispatcher, now).unwrap();
        assert_eq!(scheduled, 2);
    }

    #[test]
    fn second_scan_schedules_nothing_new() {
        let now = 1_000_000;
        let (conn, events) = setup_with_events(&[now + 5 * 60_000]);
        let dispatcher = RecordingDispatcher::default();

        assert_eq!(run_reminder_scan(&conn, &dispatcher, now).unwrap(), 1);
        assert_eq!(run_reminder_scan(&conn, &dispatcher, now).unwrap(), 0);

        let scheduled = dispatcher.scheduled.lock().unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].0, events[0].id);
    }

    #[test]
    fn registration_failure_does_not_abort_the_scan() {
        let now = 1_000_000;
        let (conn, _) = setup_with_events(&[now + 60_000, now + 120_000]);
        let dispatcher = RecordingDispatcher {
            fail: true,
            ..RecordingDispatcher::default()
        };

        // Both claims succeed, both registrations fail, no error escapes.
        let scheduled = run_reminder_scan(&conn, &dispatcher, now).unwrap();
        assert_eq!(scheduled, 0);
    }
}
