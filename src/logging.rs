//! Tracing subscriber setup for the CLI
//!
//! Logs go to stderr through a non-blocking writer so stdout only ever
//! carries reports. `DEP_COMPAT_LOG` takes an `EnvFilter` directive and
//! wins over `--verbose`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DEP_COMPAT_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "dep_compat=debug" } else { "warn" }
}

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init_logging(verbose: bool, json: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false);

    // A subscriber may already be installed (tests, embedding); keep it
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_ansi(false).try_init()
    };
    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already set");
    }

    guard
}
