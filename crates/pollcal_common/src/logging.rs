//! Logging setup shared by every pollcal crate.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default level (INFO).
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// `RUST_LOG` still takes precedence for other targets; this only sets the
/// floor for the `pollcal` crates. Safe to call more than once (later calls
/// are no-ops).
pub fn init_with_level(level: Level) {
    let filter =
        EnvFilter::from_default_env().add_directive(format!("pollcal={}", level).parse().unwrap());

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
