//! Diagnostic logging for the `cf` binary.
//!
//! Logs go to stderr through a `tracing-subscriber` fmt layer, filtered by the
//! `CF_LOG` environment variable (`EnvFilter` syntax, e.g. `CF_LOG=cfcli=debug`).
//! Without it only warnings and errors are shown.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CF_LOG";

fn filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}
