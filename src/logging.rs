/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{CadenceError, Result};

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Level actually applied: `verbose` forces debug
pub fn effective_level(config: &LoggingConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.level.to_tracing_level()
    }
}

/// Filter directive used when `RUST_LOG` is not set
///
/// Targets match by prefix, so this also covers every `cadence_*` crate.
pub fn default_directive(level: Level) -> String {
    format!("cadence={}", level)
}

/// `RUST_LOG` when set, otherwise [`default_directive`]
fn build_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level)))
        .map_err(|e| CadenceError::Config(format!("Failed to create log filter: {}", e)))
}

/// Install the global subscriber: compact stdout, or JSON lines when
/// `logging.file` is set
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(effective_level(config))?;
    let output = match &config.file {
        Some(path) => json_file_layer(path)?,
        None => console_layer(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| CadenceError::Config(format!("Failed to install logger: {}", e)))
}

fn console_layer() -> OutputLayer {
    fmt::layer().with_target(true).compact().boxed()
}

fn json_file_layer(path: &Path) -> Result<OutputLayer> {
    let file = File::create(path).map_err(|e| {
        CadenceError::Config(format!(
            "Failed to create log file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(fmt::layer()
        .json()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_current_span(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .boxed())
}

/// Route logs through the test harness's captured output; safe to call
/// from every test
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = build_filter(Level::DEBUG)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(Level::DEBUG)));
        let layer = fmt::layer().with_test_writer().with_target(false).compact();

        // Another harness may already own the global subscriber
        let _ = tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_verbose_overrides_log_level() {
        let config = LoggingConfig {
            level: LogLevel::Error,
            file: None,
            verbose: true,
        };
        assert_eq!(effective_level(&config), Level::DEBUG);

        let config = LoggingConfig {
            verbose: false,
            ..config
        };
        assert_eq!(effective_level(&config), Level::ERROR);
    }

    #[test]
    fn test_default_directive_covers_workspace() {
        let directive = default_directive(Level::WARN);
        assert_eq!(directive, "cadence=WARN");
        assert!(EnvFilter::try_new(directive).is_ok());
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_unwritable_log_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("cadence.log");
        assert!(matches!(
            json_file_layer(&missing),
            Err(CadenceError::Config(_))
        ));
    }
}
