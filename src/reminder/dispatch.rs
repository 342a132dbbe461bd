//! Reminder dispatch — the seam between delivery mechanisms and the OS
//! alarm registry.

use std::sync::Arc;

use uuid::Uuid;

use super::ReminderError;

/// OS alarm contract: one-shot wake alarms keyed by integer. Registering
/// an existing key replaces the prior alarm; cancelling an unknown key is
/// a no-op, not an error.
pub trait AlarmService: Send + Sync {
    fn register(&self, key: i64, at_millis: i64, event_id: &str) -> Result<(), ReminderError>;
    fn cancel(&self, key: i64) -> Result<(), ReminderError>;
}

/// Stable integer key for an event's alarm (FNV-1a over the uuid text).
/// The same event always maps to the same key, so rescheduling replaces
/// rather than duplicates.
pub fn alarm_key(event_id: &Uuid) -> i64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x1000_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in event_id.to_string().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash as i64
}

/// Single entry point every delivery mechanism uses to arrange or revoke
/// a notification for an event.
pub trait ReminderDispatcher: Send + Sync {
    fn schedule_at(&self, event_id: &Uuid, start_time_millis: i64) -> Result<(), ReminderError>;
    fn cancel(&self, event_id: &Uuid) -> Result<(), ReminderError>;
}

/// Dispatcher backed by the OS alarm service.
pub struct AlarmReminderDispatcher {
    alarms: Arc<dyn AlarmService>,
}

impl AlarmReminderDispatcher {
    pub fn new(alarms: Arc<dyn AlarmService>) -> Self {
        Self { alarms }
    }
}

impl ReminderDispatcher for AlarmReminderDispatcher {
    fn schedule_at(&self, event_id: &Uuid, start_time_millis: i64) -> Result<(), ReminderError> {
        self.alarms
            .register(alarm_key(event_id), start_time_millis, &event_id.to_string())?;
        tracing::debug!(event_id = %event_id, at = start_time_millis, "Registered exact alarm");
        Ok(())
    }

    fn cancel(&self, event_id: &Uuid) -> Result<(), ReminderError> {
        self.alarms.cancel(alarm_key(event_id))?;
        tracing::debug!(event_id = %event_id, "Cancelled alarm");
        Ok(())
    }
}
