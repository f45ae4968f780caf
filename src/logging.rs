//! Logging setup using `tracing` + `tracing-subscriber`
//!
//! Priority for determining the filter:
//! 1. `CASCADE_LOG` environment variable (any `EnvFilter` directive, e.g.
//!    "debug" or "cascade::planner=trace")
//! 2. `--verbose` selects `debug`
//! 3. default to `warn`
//!
//! Logs go to stderr so that stdout stays clean for text and JSON output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CASCADE_LOG";

/// Initialise the global logging subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .map_err(|e| anyhow::anyhow!("Invalid {} filter: {}", LOG_ENV, e))?,
        _ => EnvFilter::new(default_directive(verbose)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .try_init();

    Ok(())
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "debug");
    }
}
