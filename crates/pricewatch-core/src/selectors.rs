use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Ordered CSS selector lists used to locate product fields.
///
/// Each list is tried front to back; the first selector that matches and
/// yields a value wins. Marketplace markup changes between A/B variants, so
/// older selectors stay in the list as fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub price: Vec<String>,
    pub title: Vec<String>,
    /// Result cards on a keyword listing page.
    pub listing_card: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            price: vec![
                ".ui-pdp-price__second-line .andes-money-amount__fraction".to_string(),
                ".price-tag-fraction".to_string(),
                ".andes-money-amount__fraction".to_string(),
            ],
            title: vec!["h1.ui-pdp-title".to_string(), "h1[class*='title']".to_string()],
            listing_card: vec!["li.ui-search-layout__item".to_string()],
        }
    }
}

impl SelectorConfig {
    /// Selector group that matches as soon as any price selector is present.
    /// Used as the "content ready" signal for product pages.
    #[must_use]
    pub fn product_ready(&self) -> String {
        self.price.join(", ")
    }

    /// Selector group that matches as soon as any listing card is present.
    #[must_use]
    pub fn listing_ready(&self) -> String {
        self.listing_card.join(", ")
    }
}

/// Load and validate selector lists from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selectors(path: &Path) -> Result<SelectorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let selectors: SelectorConfig =
        serde_yaml::from_str(&content).map_err(ConfigError::SelectorsFileParse)?;

    validate_selectors(&selectors)?;

    Ok(selectors)
}

fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    for (field, list) in [
        ("price", &selectors.price),
        ("title", &selectors.title),
        ("listing_card", &selectors.listing_card),
    ] {
        if list.is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector list '{field}' must contain at least one selector"
            )));
        }
        if list.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "selector list '{field}' contains a blank selector"
            )));
        }
    }
    Ok(())
}
