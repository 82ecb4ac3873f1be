//! Tracing setup shared by every front end.
//!
//! Events go to stderr and to `logs/enterverse.YYYY-MM-DD.log` under the
//! data directory, rotated daily.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::RuntimeError;

pub const DEFAULT_FILTER: &str =
    "enterverse_cli=info,enterverse_core=info,enterverse_runtime=info,enterverse_api=info,warn";

const LOG_FILE_PREFIX: &str = "enterverse";

/// Build the filter: `RUST_LOG` wins, then `configured`, then [`DEFAULT_FILTER`].
pub fn env_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(directive) => EnvFilter::try_new(directive),
            None => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost.
pub fn init_logging(data_dir: &Path, configured: Option<&str>) -> Result<WorkerGuard, RuntimeError> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|e| RuntimeError::Config(e.to_string()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(configured))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| RuntimeError::Config(e.to_string()))?;

    tracing::info!("Logging initialized - logs written to {}", log_dir.display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive_falls_back() {
        // Only meaningful when RUST_LOG is unset; never panics either way.
        let filter = env_filter(Some("enterverse=[bad"));
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_default_filter_names_every_crate() {
        for target in ["enterverse_cli", "enterverse_core", "enterverse_runtime", "enterverse_api"] {
            assert!(DEFAULT_FILTER.contains(&format!("{target}=info")), "{target}");
        }
        assert!(!DEFAULT_FILTER.contains("=debug"));
        assert_eq!(
            enterverse_core::config::AppConfig::default().general.log_level,
            DEFAULT_FILTER
        );
    }
}
