//! Structured logging for LifeLink services.
//!
//! Services call [`init`] once at startup. The output format is chosen by
//! the `LIFELINK_LOG_FORMAT` environment variable (`json` for aggregation
//! pipelines, anything else for human-readable output) and the level by
//! `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for a service process.
///
/// Reads `LIFELINK_LOG_FORMAT` to pick the output format and `RUST_LOG`
/// for the level filter (default `info`).
///
/// # Example
/// ```no_run
/// use lifelink_core::logging;
///
/// logging::init();
/// tracing::info!("Dispatch gateway started");
/// ```
pub fn init() {
    match std::env::var("LIFELINK_LOG_FORMAT").as_deref() {
        Ok("json") => init_json(),
        _ => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .init();
        }
    }
}

/// Initialize logging with JSON output unconditionally.
///
/// Suitable for log aggregation systems and structured log analysis.
///
/// # Example
/// ```no_run
/// use lifelink_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "dispatch-gateway", "Service started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_default_filter_is_info() {
        // A subscriber can only be installed once per process, so the test
        // covers filter construction rather than init itself.
        let filter = EnvFilter::new("info");
        assert_eq!(filter.to_string(), "info");
    }
}
