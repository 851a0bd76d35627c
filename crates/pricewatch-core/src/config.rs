use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::selectors::{load_selectors, SelectorConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or the selectors file cannot be loaded.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or the selectors file cannot be loaded.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every option has a default, so an empty environment yields a usable config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        parse_bool(&raw).ok_or_else(|| invalid(var, format!("expected a boolean, got \"{raw}\"")))
    };

    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");

    let nav_timeout_ms = parse_u64("PRICEWATCH_NAV_TIMEOUT_MS", "30000")?;
    let content_wait_ms = parse_u64("PRICEWATCH_CONTENT_WAIT_MS", "10000")?;
    let headless = parse_flag("PRICEWATCH_HEADLESS", "true")?;
    let chrome_path = optional("PRICEWATCH_CHROME_PATH").map(PathBuf::from);

    let max_retries = parse_u32("PRICEWATCH_MAX_RETRIES", "3")?;
    let retry_base_delay_secs = parse_f64("PRICEWATCH_RETRY_BASE_DELAY_SECS", "2.0")?;
    if !retry_base_delay_secs.is_finite() || retry_base_delay_secs < 0.0 {
        return Err(invalid(
            "PRICEWATCH_RETRY_BASE_DELAY_SECS",
            format!("must be a non-negative number of seconds, got {retry_base_delay_secs}"),
        ));
    }

    let screenshot_on_error = parse_flag("PRICEWATCH_SCREENSHOT_ON_ERROR", "true")?;
    let screenshot_dir = PathBuf::from(or_default("PRICEWATCH_SCREENSHOT_DIR", "data/screenshots"));

    let max_concurrent_fetches = parse_usize("PRICEWATCH_MAX_CONCURRENT_FETCHES", "3")?;
    if max_concurrent_fetches == 0 {
        return Err(invalid(
            "PRICEWATCH_MAX_CONCURRENT_FETCHES",
            "must be at least 1".to_string(),
        ));
    }

    let data_dir = PathBuf::from(or_default("PRICEWATCH_DATA_DIR", "data"));
    let targets_path = PathBuf::from(or_default("PRICEWATCH_TARGETS_PATH", "products.csv"));
    let history_path = PathBuf::from(or_default("PRICEWATCH_HISTORY_PATH", "data/history.csv"));
    let activity_log_path =
        PathBuf::from(or_default("PRICEWATCH_ACTIVITY_LOG", "bot_activity.log"));
    let sheet_webhook_url = optional("PRICEWATCH_SHEET_WEBHOOK_URL");

    let selectors = match optional("PRICEWATCH_SELECTORS_PATH") {
        Some(path) => load_selectors(&PathBuf::from(path))?,
        None => SelectorConfig::default(),
    };

    Ok(AppConfig {
        log_level,
        nav_timeout_ms,
        content_wait_ms,
        headless,
        chrome_path,
        max_retries,
        retry_base_delay_secs,
        screenshot_on_error,
        screenshot_dir,
        max_concurrent_fetches,
        data_dir,
        targets_path,
        history_path,
        activity_log_path,
        sheet_webhook_url,
        selectors,
    })
}

/// Parse common boolean spellings. Returns `None` for anything else.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
