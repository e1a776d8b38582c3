//! Log output for the host binary.
//!
//! The crate logs through the `log` facade; `init_logging` installs a
//! `tracing-subscriber` fmt subscriber whose log bridge picks those records
//! up. The filter comes from `FLOW_LOG` (`EnvFilter` directives such as
//! `debug` or `pourover_flow=trace`) and defaults to info.

use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "FLOW_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install the subscriber with the filter from `FLOW_LOG`.
///
/// Fails if a global subscriber or logger is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let directives = std::env::var(LOG_LEVEL_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

/// Filter from `FLOW_LOG`-style directives; invalid or missing input gives the default
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_defaults_to_info() {
        assert_eq!(env_filter(None).to_string(), "info");
    }

    #[test]
    fn test_env_filter_reads_directives() {
        assert_eq!(env_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            env_filter(Some(" pourover_flow=trace ")).to_string(),
            "pourover_flow=trace"
        );
    }

    #[test]
    fn test_invalid_level_falls_back() {
        assert_eq!(env_filter(Some("pourover_flow=loud")).to_string(), "info");
    }
}
