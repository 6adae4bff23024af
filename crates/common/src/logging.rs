//! Tracing setup.
//!
//! Logs always go to stderr. Stdout carries measurement output, and in JSON
//! mode it must stay one event per line.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// `RUST_LOG` wins over the configured level; an unparsable level falls
/// back to `info`.
pub fn level_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = fmt()
        .with_env_filter(level_filter(config))
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().with_target(true).try_init()
    };
    installed.is_ok()
}

/// Route `debug` logs through the libtest capture so failing tests show
/// the session trace. Safe to call from every test.
pub fn init_test_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init()
        .ok();
}
