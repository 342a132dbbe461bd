pub mod calendar; // Best-effort calendar mirror
pub mod config;
pub mod db;
pub mod models;
pub mod parser; // LLM prescription parser collaborator
pub mod reminder; // Redundant reminder delivery
pub mod schedule; // Pure schedule generation
pub mod service; // Prescription mutation surface

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Call once at process start.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
