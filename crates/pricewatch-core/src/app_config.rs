use std::path::PathBuf;

use crate::selectors::SelectorConfig;

/// Marketplace hosts the scraper is allowed to visit. A host matches when it
/// equals an entry or is a subdomain of one.
pub const SUPPORTED_DOMAINS: &[&str] = &[
    "mercadolibre.com.ar",
    "mercadolibre.com.mx",
    "mercadolibre.com",
];

/// Every record is tagged with this code; the marketplace only displays
/// whole-unit local prices.
pub const CURRENCY_CODE: &str = "ARS";

/// Keyword searches are issued against this listing host.
pub const LISTING_BASE_URL: &str = "https://listado.mercadolibre.com.ar";

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub nav_timeout_ms: u64,
    pub content_wait_ms: u64,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub max_retries: u32,
    pub retry_base_delay_secs: f64,
    pub screenshot_on_error: bool,
    pub screenshot_dir: PathBuf,
    pub max_concurrent_fetches: usize,
    pub data_dir: PathBuf,
    pub targets_path: PathBuf,
    pub history_path: PathBuf,
    pub activity_log_path: PathBuf,
    pub sheet_webhook_url: Option<String>,
    pub selectors: SelectorConfig,
}

/// Same values as an empty environment.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            nav_timeout_ms: 30_000,
            content_wait_ms: 10_000,
            headless: true,
            chrome_path: None,
            max_retries: 3,
            retry_base_delay_secs: 2.0,
            screenshot_on_error: true,
            screenshot_dir: PathBuf::from("data/screenshots"),
            max_concurrent_fetches: 3,
            data_dir: PathBuf::from("data"),
            targets_path: PathBuf::from("products.csv"),
            history_path: PathBuf::from("data/history.csv"),
            activity_log_path: PathBuf::from("bot_activity.log"),
            sheet_webhook_url: None,
            selectors: SelectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Creates the data and screenshot directories if they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::DataDir`] if a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<(), crate::ConfigError> {
        for dir in [&self.data_dir, &self.screenshot_dir] {
            std::fs::create_dir_all(dir).map_err(|e| crate::ConfigError::DataDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("nav_timeout_ms", &self.nav_timeout_ms)
            .field("content_wait_ms", &self.content_wait_ms)
            .field("headless", &self.headless)
            .field("chrome_path", &self.chrome_path)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_secs", &self.retry_base_delay_secs)
            .field("screenshot_on_error", &self.screenshot_on_error)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("data_dir", &self.data_dir)
            .field("targets_path", &self.targets_path)
            .field("history_path", &self.history_path)
            .field("activity_log_path", &self.activity_log_path)
            .field(
                "sheet_webhook_url",
                &self.sheet_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("selectors", &self.selectors)
            .finish()
    }
}
