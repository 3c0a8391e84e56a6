pub mod clock;
pub mod config;
pub mod db;
pub mod identity;
pub mod models;
pub mod surveillance; // ADR correlation, alert lifecycle, acknowledgment gate

pub use surveillance::service::SurveillanceService;
pub use surveillance::types::{ErrorKind, SurveillanceError};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to [`config::default_log_filter`].
/// Safe to call more than once: later calls are ignored.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if result.is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
