//! Prescription service — the mutation surface over the store, the
//! materializer, and the reminder dispatcher.
//!
//! Every function takes its collaborators explicitly; nothing here owns a
//! connection or global state. Scheduling failures degrade (logged, the
//! other delivery mechanisms still stand); store failures propagate to
//! the caller.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::event::{
    count_completed_events_by_prescription, count_events_by_prescription, delete_event,
    delete_events_by_prescription, get_events_by_prescription, insert_events,
    mark_event_incomplete, update_event_notes,
};
use crate::db::repository::prescription::{
    delete_prescription, get_prescription_by_id, insert_prescription, set_prescription_status,
    update_prescription,
};
use crate::db::DatabaseError;
use crate::models::{MedicationEvent, Prescription, PrescriptionStatus, UserSettings};
use crate::parser::RawPrescription;
use crate::reminder::ReminderDispatcher;
use crate::schedule::{materialize, midnight_utc};

/// Adherence summary for one prescription.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionStats {
    pub total_events: u32,
    pub completed_events: u32,
    /// Percent of events completed (0 when no events exist).
    pub completion_rate: u32,
}

/// Save an approved parse result: persist the prescription, materialize
/// its events, and register an exact alarm for every future event.
///
/// The start date is the midnight of the day of approval; the schedule
/// comes from the parser or, when it stayed silent, the aggregator.
pub fn create_prescription(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    parsed: &RawPrescription,
    settings: &UserSettings,
    title: &str,
    now_millis: i64,
) -> Result<Uuid, DatabaseError> {
    let schedule = parsed.resolve_schedule();
    let prescription = Prescription::new(
        title,
        parsed.medications(),
        schedule,
        midnight_utc(now_millis),
        now_millis,
    );

    insert_prescription(conn, &prescription)?;

    let events = materialize(&prescription, settings, now_millis);
    insert_events(conn, &events)?;
    schedule_future_alarms(dispatcher, &events, now_millis);

    tracing::info!(
        prescription_id = %prescription.id,
        events = events.len(),
        "Prescription created"
    );
    Ok(prescription.id)
}

/// Apply an edit and rebuild the event set.
///
/// With `preserve_past_events`, history the patient already acted on is
/// untouched: only future events are cancelled, deleted, and regenerated,
/// and regenerated events that would land in the past are discarded.
/// Without it, the whole event set is rebuilt from scratch.
pub fn update_prescription_and_recalculate(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    prescription: &Prescription,
    settings: &UserSettings,
    preserve_past_events: bool,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    update_prescription(conn, prescription)?;

    let current = get_events_by_prescription(conn, &prescription.id)?;

    if preserve_past_events {
        for event in current.iter().filter(|e| e.start_time_millis >= now_millis) {
            cancel_alarm(dispatcher, &event.id);
            delete_event(conn, &event.id)?;
        }

        let new_events: Vec<MedicationEvent> = materialize(prescription, settings, now_millis)
            .into_iter()
            .filter(|e| e.start_time_millis >= now_millis)
            .collect();

        insert_events(conn, &new_events)?;
        schedule_future_alarms(dispatcher, &new_events, now_millis);
    } else {
        for event in &current {
            cancel_alarm(dispatcher, &event.id);
        }
        delete_events_by_prescription(conn, &prescription.id)?;

        let new_events = materialize(prescription, settings, now_millis);
        insert_events(conn, &new_events)?;
        schedule_future_alarms(dispatcher, &new_events, now_millis);
    }

    tracing::info!(
        prescription_id = %prescription.id,
        preserve_past_events,
        "Prescription updated, events recalculated"
    );
    Ok(())
}

/// Archive a prescription: it stops producing reminders, its events stay
/// queryable as history.
pub fn archive_prescription(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    id: &Uuid,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    set_prescription_status(conn, id, PrescriptionStatus::Archived)?;

    for event in get_events_by_prescription(conn, id)?
        .iter()
        .filter(|e| e.start_time_millis >= now_millis)
    {
        cancel_alarm(dispatcher, &event.id);
    }

    tracing::info!(prescription_id = %id, "Prescription archived");
    Ok(())
}

/// Reactivate an archived prescription. Upcoming events resume producing
/// reminders through the scan loops; no alarms are re-registered eagerly.
pub fn restore_prescription(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    set_prescription_status(conn, id, PrescriptionStatus::Active)?;
    tracing::info!(prescription_id = %id, "Prescription restored");
    Ok(())
}

/// Hard delete: cancel every pending alarm, then cascade-delete the
/// events and the prescription row. Alarms go first so none can fire for
/// a row that no longer exists.
pub fn purge_prescription(
    conn: &Connection,
    dispatcher: &dyn ReminderDispatcher,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    for event in get_events_by_prescription(conn, id)? {
        cancel_alarm(dispatcher, &event.id);
    }
    delete_events_by_prescription(conn, id)?;
    delete_prescription(conn, id)?;

    tracing::info!(prescription_id = %id, "Prescription purged");
    Ok(())
}

/// Un-complete an event (mis-tap recovery).
pub fn set_event_incomplete(conn: &Connection, event_id: &Uuid) -> Result<(), DatabaseError> {
    mark_event_incomplete(conn, event_id)
}

pub fn set_event_notes(
    conn: &Connection,
    event_id: &Uuid,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    update_event_notes(conn, event_id, notes)
}

pub fn prescription_stats(
    conn: &Connection,
    id: &Uuid,
) -> Result<PrescriptionStats, DatabaseError> {
    if get_prescription_by_id(conn, id)?.is_none() {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".into(),
            id: id.to_string(),
        });
    }

    let total_events = count_events_by_prescription(conn, id)?;
    let completed_events = count_completed_events_by_prescription(conn, id)?;
    let completion_rate = if total_events > 0 {
        completed_events * 100 / total_events
    } else {
        0
    };

    Ok(PrescriptionStats {
        total_events,
        completed_events,
        completion_rate,
    })
}

fn schedule_future_alarms(
    dispatcher: &dyn ReminderDispatcher,
    events: &[MedicationEvent],
    now_millis: i64,
) {
    for event in events.iter().filter(|e| e.start_time_millis > now_millis) {
        if let Err(e) = dispatcher.schedule_at(&event.id, event.start_time_millis) {
            tracing::warn!(event_id = %event.id, error = %e, "Alarm registration failed");
        }
    }
}

fn cancel_alarm(dispatcher: &dyn ReminderDispatcher, event_id: &Uuid) {
    if let Err(e) = dispatcher.cancel(event_id) {
        tracing::warn!(event_id = %event_id, error = %e, "Alarm cancellation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::config::MILLIS_PER_DAY;
    use crate::db::repository::event::{get_event_by_id, mark_event_completed};
    use crate::db::sqlite::open_memory_database;
    use crate::models::Schedule;
    use crate::parser::{RawMedication, RawSchedule};
    use crate::reminder::{alarm_key, AlarmReminderDispatcher, ReminderError, ThreadAlarmService};

    #[derive(Default)]
    struct RecordingDispatcher {
        scheduled: Mutex<Vec<Uuid>>,
        cancelled: Mutex<Vec<Uuid>>,
    }

    impl ReminderDispatcher for RecordingDispatcher {
        fn schedule_at(&self, event_id: &Uuid, _start: i64) -> Result<(), ReminderError> {
            self.scheduled.lock().unwrap().push(*event_id);
            Ok(())
        }

        fn cancel(&self, event_id: &Uuid) -> Result<(), ReminderError> {
            self.cancelled.lock().unwrap().push(*event_id);
            Ok(())
        }
    }

    fn raw_medication(name: &str) -> RawMedication {
        RawMedication {
            name: name.to_string(),
            dosage: "500mg".to_string(),
            frequency: "three times daily".to_string(),
            duration: "3 days".to_string(),
            instructions: None,
        }
    }

    fn two_med_three_day_parse() -> RawPrescription {
        RawPrescription {
            medications: vec![raw_medication("MedA"), raw_medication("MedB")],
            schedule: Some(RawSchedule {
                times_per_day: Some(3),
                duration_days: Some(3),
                interval_days: Some(1),
                ..RawSchedule::default()
            }),
        }
    }

    #[test]
    fn create_materializes_nine_events_for_three_days() {
        let conn = open_memory_database().unwrap();
        let dispatcher = RecordingDispatcher::default();
        let now = 10 * MILLIS_PER_DAY + 6 * 3_600_000; // 06:00 on day 10

        let id = create_prescription(
            &conn,
            &dispatcher,
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            now,
        )
        .unwrap();

        let events = get_events_by_prescription(&conn, &id).unwrap();
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(|e| e.title == "MedA, MedB"));

        for day in 0..3 {
            let day_start = 10 * MILLIS_PER_DAY + day * MILLIS_PER_DAY;
            let on_day = events
                .iter()
                .filter(|e| midnight_utc(e.start_time_millis) == day_start)
                .count();
            assert_eq!(on_day, 3);
        }

        // All events after 06:00 are future, so each got an alarm.
        assert_eq!(dispatcher.scheduled.lock().unwrap().len(), 9);
    }

    #[test]
    fn preserve_past_keeps_history_untouched() {
        let conn = open_memory_database().unwrap();
        let dispatcher = RecordingDispatcher::default();
        let created_at = 10 * MILLIS_PER_DAY;

        let id = create_prescription(
            &conn,
            &dispatcher,
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            created_at,
        )
        .unwrap();

        // Complete one of day 0's events and claim its reminder.
        let before = get_events_by_prescription(&conn, &id).unwrap();
        let past_event = before[0].clone();
        mark_event_completed(&conn, &past_event.id, past_event.start_time_millis).unwrap();
        crate::db::repository::event::claim_reminder(&conn, &before[1].id).unwrap();

        // Edit mid-course on day 1 at noon: drop to 2 doses/day.
        let now = 11 * MILLIS_PER_DAY + 12 * 3_600_000;
        let mut edited = get_prescription_by_id(&conn, &id).unwrap().unwrap();
        edited.schedule = Schedule {
            times_per_day: 2,
            preferred_times: vec![],
            duration_days: 3,
            ..Schedule::default()
        };
        update_prescription_and_recalculate(
            &conn,
            &dispatcher,
            &edited,
            &UserSettings::default(),
            true,
            now,
        )
        .unwrap();

        let after = get_events_by_prescription(&conn, &id).unwrap();

        // Past events survive with their state intact.
        let kept = get_event_by_id(&conn, &past_event.id).unwrap().unwrap();
        assert!(kept.is_completed);
        assert_eq!(kept.completed_at_millis, Some(past_event.start_time_millis));
        let claimed = get_event_by_id(&conn, &before[1].id).unwrap().unwrap();
        assert!(claimed.reminder_sent);

        // No event anywhere was rewritten into the past.
        for event in &after {
            if event.start_time_millis >= now {
                // Regenerated future events are fresh rows at 2/day.
                assert_eq!(event.title, "MedA, MedB");
            } else {
                // Every pre-edit event still present predates the edit.
                assert!(before.iter().any(|b| b.id == event.id));
            }
        }

        // Day 2 now carries exactly 2 doses.
        let day2 = 12 * MILLIS_PER_DAY;
        let on_day2 = after
            .iter()
            .filter(|e| midnight_utc(e.start_time_millis) == day2)
            .count();
        assert_eq!(on_day2, 2);
    }

    #[test]
    fn full_rebuild_replaces_every_event() {
        let conn = open_memory_database().unwrap();
        let dispatcher = RecordingDispatcher::default();

        let id = create_prescription(
            &conn,
            &dispatcher,
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            0,
        )
        .unwrap();
        let before = get_events_by_prescription(&conn, &id).unwrap();

        let prescription = get_prescription_by_id(&conn, &id).unwrap().unwrap();
        update_prescription_and_recalculate(
            &conn,
            &dispatcher,
            &prescription,
            &UserSettings::default(),
            false,
            MILLIS_PER_DAY,
        )
        .unwrap();

        let after = get_events_by_prescription(&conn, &id).unwrap();
        assert_eq!(after.len(), 9);
        for event in &after {
            assert!(!before.iter().any(|b| b.id == event.id), "all rows are fresh");
        }
        // Every old event's alarm was cancelled.
        assert_eq!(dispatcher.cancelled.lock().unwrap().len(), 9);
    }

    #[test]
    fn purge_leaves_no_orphaned_alarms() {
        let conn = open_memory_database().unwrap();
        let alarms = Arc::new(ThreadAlarmService::new(Arc::new(|_: &str| {})));
        let dispatcher = AlarmReminderDispatcher::new(alarms.clone());

        // Creation-time registration is not under test here.
        let id = create_prescription(
            &conn,
            &RecordingDispatcher::default(),
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            0,
        )
        .unwrap();

        // Register far-future alarms for two events, as the scan loops would.
        let events = get_events_by_prescription(&conn, &id).unwrap();
        dispatcher.schedule_at(&events[0].id, i64::MAX / 2).unwrap();
        dispatcher.schedule_at(&events[1].id, i64::MAX / 2).unwrap();
        assert_eq!(alarms.pending_count(), 2);

        purge_prescription(&conn, &dispatcher, &id).unwrap();

        assert!(get_events_by_prescription(&conn, &id).unwrap().is_empty());
        assert!(get_prescription_by_id(&conn, &id).unwrap().is_none());
        for event in &events {
            assert!(!alarms.is_registered(alarm_key(&event.id)));
        }
    }

    #[test]
    fn archive_cancels_future_reminders_but_keeps_events() {
        let conn = open_memory_database().unwrap();
        let dispatcher = RecordingDispatcher::default();

        let id = create_prescription(
            &conn,
            &dispatcher,
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            0,
        )
        .unwrap();

        archive_prescription(&conn, &dispatcher, &id, 0).unwrap();

        let prescription = get_prescription_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(prescription.status, PrescriptionStatus::Archived);
        assert_eq!(get_events_by_prescription(&conn, &id).unwrap().len(), 9);
        assert_eq!(dispatcher.cancelled.lock().unwrap().len(), 9);

        restore_prescription(&conn, &id).unwrap();
        let prescription = get_prescription_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(prescription.status, PrescriptionStatus::Active);
    }

    #[test]
    fn stats_report_completion_rate() {
        let conn = open_memory_database().unwrap();
        let dispatcher = RecordingDispatcher::default();

        let id = create_prescription(
            &conn,
            &dispatcher,
            &two_med_three_day_parse(),
            &UserSettings::default(),
            "Course",
            0,
        )
        .unwrap();

        let events = get_events_by_prescription(&conn, &id).unwrap();
        for event in events.iter().take(3) {
            mark_event_completed(&conn, &event.id, event.start_time_millis).unwrap();
        }

        let stats = prescription_stats(&conn, &id).unwrap();
        assert_eq!(stats.total_events, 9);
        assert_eq!(stats.completed_events, 3);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn stats_for_missing_prescription_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = prescription_stats(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
