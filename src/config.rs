use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Remindrx";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Universal dosing-window defaults: 8:00–20:00 in minutes since midnight.
pub const DEFAULT_WINDOW_START_MINUTES: i32 = 480;
pub const DEFAULT_WINDOW_END_MINUTES: i32 = 1200;

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;
pub const MILLIS_PER_DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

/// How far ahead the delivery mechanisms look for due events.
pub const REMINDER_LOOKAHEAD_MILLIS: i64 = 30 * MILLIS_PER_MINUTE;

/// Cadence of the self-perpetuating periodic rescan.
pub const RESCAN_INTERVAL_SECS: u64 = 15 * 60;

/// Cadence of the foreground monitor backstop.
pub const MONITOR_INTERVAL_SECS: u64 = 5 * 60;

/// Get the application data directory
/// ~/Remindrx/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Get the database file path
pub fn database_path() -> PathBuf {
    app_data_dir().join("remindrx.db")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}
