//! Reminder delivery: redundant mechanisms that guarantee a notification
//! fires at each event's start time.
//!
//! Per-event state machine: UNSCHEDULED → SCHEDULED (alarm registered at
//! materialization) → FIRED (a mechanism wins the reminder claim inside
//! the lookahead window) → CONFIRMED (user marks the dose taken) or
//! EXPIRED (ignored; the event stays queryable as incomplete).
//!
//! Three mechanisms cooperate — a 15-minute periodic rescan, exact
//! one-shot alarms, and a 5-minute foreground monitor backstop. They share
//! no in-memory state: coordination happens through the persisted
//! `reminder_sent` claim flag and the alarm registry's
//! replace-on-register semantics, so any subset of mechanisms surviving
//! app kills or reboots still delivers each reminder exactly once.

pub mod background;
pub mod dispatch;
pub mod presenter;
pub mod scan;
pub mod timer;

pub use background::{
    start_foreground_monitor, start_periodic_rescan, ReminderLoopHandle, SharedConnection,
};
pub use dispatch::{alarm_key, AlarmReminderDispatcher, AlarmService, ReminderDispatcher};
pub use presenter::{confirm, present, NotificationService, ReminderNotification};
pub use scan::run_reminder_scan;
pub use timer::ThreadAlarmService;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Alarm registration failed: {0}")]
    AlarmRegistration(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}
