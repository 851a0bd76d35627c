//! Tracing setup: console output plus an ANSI-free copy appended to the
//! activity log, which `pricewatch log` reads back.

use std::path::Path;

use anyhow::Context;
use pricewatch_core::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// The returned guard flushes the activity log on drop and must be held for
/// the life of the process.
pub(crate) fn init(config: &AppConfig) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level \"{}\"", config.log_level))?;

    let (dir, file_name) = split_log_path(&config.activity_log_path)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

/// Directory and file name of the activity log. A bare file name lives in
/// the working directory.
fn split_log_path(path: &Path) -> anyhow::Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("activity log path {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_uses_working_directory() {
        let (dir, name) = split_log_path(Path::new("bot_activity.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "bot_activity.log");
    }

    #[test]
    fn nested_path_splits_at_parent() {
        let (dir, name) = split_log_path(Path::new("data/logs/activity.log")).unwrap();
        assert_eq!(dir, Path::new("data/logs"));
        assert_eq!(name, "activity.log");
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
