//! Single-attempt product extraction: URL in, [`ProductRecord`] out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pricewatch_core::{canonicalize, ProductRecord, SelectorConfig, TargetUrl, CURRENCY_CODE};
use sha2::{Digest, Sha256};

use crate::error::{FailureKind, ScrapeError};
use crate::page::{PageHandle, PageSource};
use crate::price::parse_price;
use crate::selector::{resolve, ExtractMode};

#[derive(Debug, Clone, Default)]
pub struct ExtractorSettings {
    pub selectors: SelectorConfig,
    /// Where diagnostic screenshots go. `None` disables them.
    pub screenshot_dir: Option<PathBuf>,
}

impl ExtractorSettings {
    #[must_use]
    pub fn from_config(config: &pricewatch_core::AppConfig) -> Self {
        Self {
            selectors: config.selectors.clone(),
            screenshot_dir: config
                .screenshot_on_error
                .then(|| config.screenshot_dir.clone()),
        }
    }
}

/// Screenshot file name for a failed scrape of `canonical_url`.
///
/// Stable across runs: the first 16 hex characters of the URL's SHA-256.
#[must_use]
pub fn screenshot_file_name(canonical_url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(canonical_url.as_bytes()));
    format!("error_{}.png", &digest[..16])
}

/// Best-effort screenshot of `page` into `dir`. Failures are logged and
/// swallowed.
async fn capture_screenshot<P>(page: &P, dir: &Path, canonical_url: &str)
where
    P: PageHandle + ?Sized,
{
    let path = dir.join(screenshot_file_name(canonical_url));
    match page.screenshot(&path).await {
        Ok(()) => tracing::info!(url = canonical_url, path = %path.display(), "saved diagnostic screenshot"),
        Err(e) => tracing::debug!(url = canonical_url, error = %e, "diagnostic screenshot failed"),
    }
}

pub struct ProductExtractor<S> {
    source: Arc<S>,
    settings: ExtractorSettings,
}

impl<S: PageSource> ProductExtractor<S> {
    pub fn new(source: Arc<S>, settings: ExtractorSettings) -> Self {
        Self { source, settings }
    }

    /// One extraction attempt against `url`.
    ///
    /// The URL is canonicalized and checked against the domain allowlist
    /// before any browser work. The page is closed on every exit path; an
    /// unclassified failure after it opened also leaves a screenshot behind
    /// when screenshots are enabled.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::UnsupportedDomain`] before fetching.
    /// - Any open or navigation error from the [`PageSource`].
    /// - [`ScrapeError::ProductNotFound`] when title or price selectors are
    ///   exhausted.
    /// - [`ScrapeError::MalformedPrice`] when the price text has no digits.
    pub async fn extract(&self, url: &str) -> Result<ProductRecord, ScrapeError> {
        let target = TargetUrl::parse(url).ok_or_else(|| ScrapeError::UnsupportedDomain {
            url: canonicalize(url),
        })?;

        let page = self.source.open().await?;
        let outcome = match page
            .goto(target.as_str(), &self.settings.selectors.product_ready())
            .await
        {
            Ok(()) => self.read_product(page.as_ref(), &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            if e.kind() == FailureKind::Unclassified {
                if let Some(dir) = &self.settings.screenshot_dir {
                    capture_screenshot(page.as_ref(), dir, target.as_str()).await;
                }
            }
        }
        page.close().await;
        outcome
    }

    async fn read_product(
        &self,
        page: &dyn PageHandle,
        target: &TargetUrl,
    ) -> Result<ProductRecord, ScrapeError> {
        let selectors = &self.settings.selectors;
        let not_found = |field| ScrapeError::ProductNotFound {
            url: target.as_str().to_owned(),
            field,
        };

        let title = resolve(page, &selectors.title, ExtractMode::Text)
            .await
            .map(|t| t.trim().to_owned())
            .ok_or_else(|| not_found("title"))?;

        let price_text = resolve(page, &selectors.price, ExtractMode::Text)
            .await
            .ok_or_else(|| not_found("price"))?;
        let price = parse_price(&price_text)?;

        Ok(ProductRecord {
            title,
            price,
            source_url: target.as_str().to_owned(),
            currency: CURRENCY_CODE.to_owned(),
        })
    }
}
