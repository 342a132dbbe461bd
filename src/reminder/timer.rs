//! In-process alarm adapter — thread-backed one-shot timers.
//!
//! Stands in for the platform alarm registry on desktop and in tests.
//! Semantics match the OS contract the dispatcher relies on: registering
//! an existing key replaces the pending alarm, cancelling an unknown key
//! is a no-op, and firing invokes the injected handler with the event id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use super::{AlarmService, ReminderError};

/// Called on the timer thread when an alarm fires; receives the event id.
pub type AlarmHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Poll granularity while waiting for the fire time (1 second).
const TICK_MILLIS: u64 = 1_000;

pub struct ThreadAlarmService {
    handler: AlarmHandler,
    // key → generation of the registration that currently owns it
    pending: Arc<Mutex<HashMap<i64, u64>>>,
    generation: AtomicU64,
}

impl ThreadAlarmService {
    pub fn new(handler: AlarmHandler) -> Self {
        Self {
            handler,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Number of alarms currently pending.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Whether an alarm is pending for the given key.
    pub fn is_registered(&self, key: i64) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&key)
    }
}

impl AlarmService for ThreadAlarmService {
    fn register(&self, key: i64, at_millis: i64, event_id: &str) -> Result<(), ReminderError> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, generation);

        let pending = self.pending.clone();
        let handler = self.handler.clone();
        let event_id = event_id.to_string();

        std::thread::spawn(move || {
            loop {
                // A newer registration or a cancel retires this thread.
                match pending.lock().unwrap_or_else(|p| p.into_inner()).get(&key) {
                    Some(current) if *current == generation => {}
                    _ => return,
                }

                let remaining = at_millis - Utc::now().timestamp_millis();
                if remaining <= 0 {
                    break;
                }
                std::thread::sleep(Duration::from_millis(
                    (remaining as u64).min(TICK_MILLIS),
                ));
            }

            // Fire only if this registration still owns the key.
            let owned = {
                let mut guard = pending.lock().unwrap_or_else(|p| p.into_inner());
                match guard.get(&key) {
                    Some(current) if *current == generation => {
                        guard.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if owned {
                tracing::debug!(key, event_id = %event_id, "Alarm fired");
                handler(&event_id);
            }
        });

        Ok(())
    }

    fn cancel(&self, key: i64) -> Result<(), ReminderError> {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&key);
        Ok(())
    }
}
