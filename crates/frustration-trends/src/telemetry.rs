// frustration-trends/crates/frustration-trends/src/telemetry.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber for pipeline runs.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies to this crate
/// and everything else stays at `warn` so HTTP client chatter stays quiet.
pub fn init_tracing(default_level: &str) {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("warn,frustration_trends={}", default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
