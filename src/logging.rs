//! Process-wide tracing setup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;
use crate::error::{MissionControlError, Result};

const CRATE_TARGET: &str = "mission_control";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Build the filter directives for a logging section.
///
/// Short target names are qualified with the crate name, so `registry = "debug"`
/// becomes `mission_control::registry=debug`.
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    let base = if verbose { "debug" } else { config.level.as_str() };
    let mut directives = vec![base.to_string()];

    for (target, level) in &config.targets {
        let target = if target.contains("::") || target == CRATE_TARGET {
            target.clone()
        } else {
            format!("{}::{}", CRATE_TARGET, target)
        };
        directives.push(format!("{}={}", target, level));
    }

    EnvFilter::try_new(directives.join(","))
        .map_err(|e| MissionControlError::Config(format!("invalid logging directives: {}", e)))
}

/// Install the global subscriber. Returns `false` when logging was already
/// configured earlier in the process.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<bool> {
    let filter = build_filter(config, verbose)?;

    let mut installed = false;
    INSTALLED.get_or_init(|| {
        installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.ansi)
                    .with_target(true),
            )
            .with(filter)
            .try_init()
            .is_ok();
    });

    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_targets_are_qualified() {
        let mut config = LoggingConfig::default();
        config.targets.insert("registry".into(), "debug".into());
        config.targets.insert("hyper::proto".into(), "warn".into());

        let filter = build_filter(&config, false).unwrap().to_string();
        assert!(filter.contains("mission_control::registry=debug"));
        assert!(filter.contains("hyper::proto=warn"));
    }

    #[test]
    fn test_init_only_once() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config, false).unwrap();
        assert!(!init_logging(&config, false).unwrap());
    }
}
