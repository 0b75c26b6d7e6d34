//! Process-wide logging initialization.
//!
//! Leaf protocol modules log through the `log` facade while orchestration
//! code uses `tracing` spans; `init` bridges both into one subscriber.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Reads `RUST_LOG` for filtering (default `info`) and `LOG_FORMAT=json`
/// for machine-readable output. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    let _ = result;
}
