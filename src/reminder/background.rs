//! Background reminder loops — the periodic rescan and the foreground
//! monitor backstop.
//!
//! Two independent threads run the same scan at different cadences. Either
//! one alone is enough to deliver every reminder; both together survive
//! the other being killed. Each cycle re-derives its view from the
//! persisted event store, so restarting after a reboot or reinstall needs
//! no recovery work beyond starting the loops again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;

use crate::config::{MONITOR_INTERVAL_SECS, RESCAN_INTERVAL_SECS};

use super::scan::run_reminder_scan;
use super::ReminderDispatcher;

/// Sleep granularity for shutdown responsiveness (5 seconds).
const SLEEP_GRANULARITY_SECS: u64 = 5;

/// Wait before retrying after a failed cycle (1 minute).
const RETRY_DELAY_SECS: u64 = 60;

/// Shared database handle for the loops. Each cycle takes the lock briefly;
/// all cross-mechanism coordination goes through the rows themselves.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Handle for a background reminder loop thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on `Drop`.
pub struct ReminderLoopHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReminderLoopHandle {
    /// Request graceful shutdown. A cycle in flight will complete, but no
    /// further cycles start.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for ReminderLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the self-perpetuating periodic rescan (~15 minute cadence).
pub fn start_periodic_rescan(
    conn: SharedConnection,
    dispatcher: Arc<dyn ReminderDispatcher>,
) -> ReminderLoopHandle {
    start_loop("periodic-rescan", RESCAN_INTERVAL_SECS, conn, dispatcher)
}

/// Start the foreground monitor backstop (~5 minute cadence).
pub fn start_foreground_monitor(
    conn: SharedConnection,
    dispatcher: Arc<dyn ReminderDispatcher>,
) -> ReminderLoopHandle {
    start_loop("foreground-monitor", MONITOR_INTERVAL_SECS, conn, dispatcher)
}

fn start_loop(
    name: &'static str,
    interval_secs: u64,
    conn: SharedConnection,
    dispatcher: Arc<dyn ReminderDispatcher>,
) -> ReminderLoopHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(loop_name = name, interval_secs, "Reminder loop started");
        reminder_loop(name, interval_secs, &conn, dispatcher.as_ref(), &flag);
        tracing::info!(loop_name = name, "Reminder loop shut down");
    });

    ReminderLoopHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn reminder_loop(
    name: &str,
    interval_secs: u64,
    conn: &SharedConnection,
    dispatcher: &dyn ReminderDispatcher,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        // A failed cycle must never stop the chain: log, back off briefly,
        // and arm the next run regardless.
        let sleep_secs = match run_cycle(conn, dispatcher) {
            Ok(_) => interval_secs,
            Err(e) => {
                tracing::warn!(loop_name = name, error = %e, "Reminder cycle failed, retrying");
                RETRY_DELAY_SECS
            }
        };

        // Sleep in small increments for responsive shutdown
        for _ in 0..sleep_secs.div_ceil(SLEEP_GRANULARITY_SECS) {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(Duration::from_secs(SLEEP_GRANULARITY_SECS));
        }
    }
}

fn run_cycle(
    conn: &SharedConnection,
    dispatcher: &dyn ReminderDispatcher,
) -> Result<u32, crate::db::DatabaseError> {
    let now_millis = Utc::now().timestamp_millis();
    let guard = conn
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    run_reminder_scan(&guard, dispatcher, now_millis)
}
