//! Logging setup for test binaries and embedding programs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber honoring `RUST_LOG`
///
/// Output goes through the test writer so `cargo test` captures it per test.
/// Returns `false` if a subscriber was already installed, which makes it safe
/// to call from every test.
pub fn init_logging() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turn_harness=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_target(false),
        )
        .try_init()
        .is_ok()
}

/// Same as [`init_logging`] but emitting one JSON object per event
pub fn init_json_logging() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turn_harness=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .try_init()
        .is_ok()
}
