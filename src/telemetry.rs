//! Tracing integration for fast_word_search.
//!
//! Initializes a `fmt` subscriber writing to stderr, leaving stdout to the
//! command loop's presentation output. The fmt layer's synchronized writer
//! is what keeps concurrent worker log lines from interleaving.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// An env-filter honours `RUST_LOG`, falling back to the CLI level.
/// Diagnostics go to stderr so search listings on stdout stay clean.
pub fn init_telemetry(log_level: Level) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
