//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// Log output goes to stderr (stdout is reserved for saved paths and JSON),
/// and `RUST_LOG` overrides the level.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the loaded config, with CLI overrides.
///
/// `--verbose` forces debug; otherwise the configured level is used.
/// The spinner shares stderr, so the default stays at `warn` unless the
/// config asks for more.
pub fn init_from_config(
    config: &banana_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else if configured == "info" {
        "warn"
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins() {
        assert_eq!(effective_level("error", true), "debug");
    }

    #[test]
    fn info_is_quietened_for_the_spinner() {
        assert_eq!(effective_level("info", false), "warn");
        assert_eq!(effective_level("trace", false), "trace");
    }
}
