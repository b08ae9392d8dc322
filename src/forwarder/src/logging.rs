use crate::config::Config;
use crate::constants::{LOG_FILE_NAME, QUIET_DEPENDENCIES};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

/// Maps the level names accepted in `LOG_LEVEL` onto `tracing` directives.
///
/// `WARNING` and `CRITICAL` are kept for older deployments.
pub fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_uppercase().as_str() {
        "WARNING" => "warn".to_string(),
        "CRITICAL" | "FATAL" => "error".to_string(),
        "" => "info".to_string(),
        _ => level.trim().to_ascii_lowercase(),
    }
}

fn filter_directives(level: &str) -> String {
    std::iter::once(normalize_level(level))
        .chain(QUIET_DEPENDENCIES.iter().map(|directive| directive.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. The returned guard must be held for as
/// long as the file writer should keep flushing.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(filter_directives(&config.log_level))
        .with_context(|| format!("invalid log_level '{}'", config.log_level))?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_timer(SystemTime)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match config.log_dir.as_deref() {
        Some(dir) => tracing::info!("Logging initialized, writing to {}/{}", dir, LOG_FILE_NAME),
        None => tracing::info!("Logging initialized"),
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("INFO", "info")]
    #[case("debug", "debug")]
    #[case("WARNING", "warn")]
    #[case("CRITICAL", "error")]
    #[case(" Error ", "error")]
    #[case("", "info")]
    fn test_normalize_level(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_level(input), expected);
    }

    #[test]
    fn test_filter_directives_quiet_sdk_crates() {
        let directives = filter_directives("WARNING");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("aws_smithy_runtime=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
