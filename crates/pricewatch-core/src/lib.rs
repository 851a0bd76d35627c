pub mod app_config;
pub mod config;
pub mod products;
pub mod selectors;
pub mod targets;

use thiserror::Error;

pub use app_config::{AppConfig, CURRENCY_CODE, LISTING_BASE_URL, SUPPORTED_DOMAINS};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{HistoryEntry, ProductRecord};
pub use selectors::{load_selectors, SelectorConfig};
pub use targets::{canonicalize, is_supported_domain, TargetUrl};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to create data directory {path}: {source}")]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
