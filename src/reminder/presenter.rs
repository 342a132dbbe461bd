//! Notification presentation — the user-visible end of the pipeline.
//!
//! `present` is invoked when an exact alarm fires; `confirm` is the only
//! user-facing path back into the event state machine.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::event::{get_event_by_id, mark_event_completed};
use crate::db::repository::prescription::get_prescription_by_id;
use crate::db::DatabaseError;

use super::dispatch::alarm_key;

/// OS notification contract: post/cancel by integer key, plus a live
/// permission check consulted before every post.
pub trait NotificationService: Send + Sync {
    fn notifications_permitted(&self) -> bool;
    fn post(&self, key: i64, notification: &ReminderNotification) -> Result<(), super::ReminderError>;
    fn cancel(&self, key: i64) -> Result<(), super::ReminderError>;
}

/// High-priority, full-content reminder alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub title: String,
    pub body: String,
    /// Opens the confirmation view scoped to this event.
    pub confirm_link: String,
}

/// Deep link that opens the confirmation view for an event.
pub fn confirm_link(event_id: &Uuid) -> String {
    format!("remindrx://event/{event_id}/confirm")
}

/// Post the reminder for an event.
///
/// Tolerates the world having moved on since the alarm was registered: a
/// deleted row, a completed event, or revoked notification permission all
/// log and skip rather than fail — background delivery never surfaces
/// hard errors to the user.
pub fn present(
    conn: &Connection,
    notifier: &dyn NotificationService,
    event_id: &Uuid,
) -> Result<(), DatabaseError> {
    let Some(event) = get_event_by_id(conn, event_id)? else {
        tracing::warn!(event_id = %event_id, "Alarm fired for missing event, skipping");
        return Ok(());
    };

    if event.is_completed {
        tracing::debug!(event_id = %event_id, "Event already completed, skipping notification");
        return Ok(());
    }

    let prescription_title = get_prescription_by_id(conn, &event.prescription_id)?
        .map(|rx| rx.title)
        .unwrap_or_else(|| "Medication Reminder".to_string());

    if !notifier.notifications_permitted() {
        tracing::warn!(event_id = %event_id, "Notifications not permitted, reminder dropped");
        return Ok(());
    }

    let notification = ReminderNotification {
        title: "Time for your medication".to_string(),
        body: format!("{prescription_title} - {}", event.description),
        confirm_link: confirm_link(event_id),
    };

    if let Err(e) = notifier.post(alarm_key(event_id), &notification) {
        tracing::warn!(event_id = %event_id, error = %e, "Notification post rejected");
    }
    Ok(())
}

/// Confirm an intake: mark the event completed and take down the alert.
pub fn confirm(
    conn: &Connection,
    notifier: &dyn NotificationService,
    event_id: &Uuid,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    mark_event_completed(conn, event_id, now_millis)?;

    if let Err(e) = notifier.cancel(alarm_key(event_id)) {
        tracing::warn!(event_id = %event_id, error = %e, "Notification cancel failed");
    }
    tracing::info!(event_id = %event_id, "Intake confirmed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::db::repository::event::insert_events;
    use crate::db::repository::prescription::insert_prescription;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{MedicationEvent, ParsedMedication, Prescription, Schedule};
    use crate::reminder::ReminderError;

    #[derive(Default)]
    struct RecordingNotifier {
        denied: bool,
        posted: Mutex<Vec<(i64, ReminderNotification)>>,
        cancelled: Mutex<Vec<i64>>,
    }

    impl NotificationService for RecordingNotifier {
        fn notifications_permitted(&self) -> bool {
            !self.denied
        }

        fn post(&self, key: i64, n: &ReminderNotification) -> Result<(), ReminderError> {
            self.posted.lock().unwrap().push((key, n.clone()));
            Ok(())
        }

        fn cancel(&self, key: i64) -> Result<(), ReminderError> {
            self.cancelled.lock().unwrap().push(key);
            Ok(())
        }
    }

    fn setup() -> (Connection, MedicationEvent) {
        let conn = open_memory_database().unwrap();
        let rx = Prescription::new(
            "Evening meds",
            vec![ParsedMedication::new("MedA", "1 tab", "daily", "7 days")],
            Schedule::default(),
            0,
            0,
        );
        insert_prescription(&conn, &rx).unwrap();

        let event = MedicationEvent::new(rx.id, "MedA", "MedA: 1 tab", 1_000, 2_000, 0);
        insert_events(&conn, &[event.clone()]).unwrap();
        (conn, event)
    }

    #[test]
    fn posts_full_content_alert_with_confirm_link() {
        let (conn, event) = setup();
        let notifier = RecordingNotifier::default();

        present(&conn, &notifier, &event.id).unwrap();

        let posted = notifier.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, alarm_key(&event.id));
        assert_eq!(posted[0].1.title, "Time for your medication");
        assert!(posted[0].1.body.starts_with("Evening meds - "));
        assert_eq!(posted[0].1.confirm_link, confirm_link(&event.id));
    }

    #[test]
    fn missing_event_row_is_skipped_not_an_error() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::default();

        present(&conn, &notifier, &Uuid::new_v4()).unwrap();
        assert!(notifier.posted.lock().unwrap().is_empty());
    }

    #[test]
    fn completed_event_is_not_re_notified() {
        let (conn, event) = setup();
        mark_event_completed(&conn, &event.id, 900).unwrap();
        let notifier = RecordingNotifier::default();

        present(&conn, &notifier, &event.id).unwrap();
        assert!(notifier.posted.lock().unwrap().is_empty());
    }

    #[test]
    fn permission_denial_drops_the_alert_quietly() {
        let (conn, event) = setup();
        let notifier = RecordingNotifier {
            denied: true,
            ..RecordingNotifier::default()
        };

        present(&conn, &notifier, &event.id).unwrap();
        assert!(notifier.posted.lock().unwrap().is_empty());
    }

    #[test]
    fn confirm_completes_event_and_cancels_alert() {
        let (conn, event) = setup();
        let notifier = RecordingNotifier::default();

        confirm(&conn, &notifier, &event.id, 1_500).unwrap();

        let loaded = get_event_by_id(&conn, &event.id).unwrap().unwrap();
        assert!(loaded.is_completed);
        assert_eq!(loaded.completed_at_millis, Some(1_500));
        assert_eq!(notifier.cancelled.lock().unwrap()[0], alarm_key(&event.id));
    }

    #[test]
    fn confirm_missing_event_is_an_error() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::default();

        let err = confirm(&conn, &notifier, &Uuid::new_v4(), 1_000).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
