//! Retrying, bounded-concurrency entry points over [`ProductExtractor`].

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use pricewatch_core::{canonicalize, AppConfig, ProductRecord};

use crate::browser::{ChromeFetcher, FetchSettings};
use crate::error::{FailureKind, ScrapeError};
use crate::extract::{ExtractorSettings, ProductExtractor};
use crate::page::PageSource;
use crate::retry::RetryPolicy;

/// Owns the shared page source for one run.
///
/// `close()` must not be called while scrapes are in flight.
pub struct Scraper<S = ChromeFetcher> {
    source: Arc<S>,
    extractor: ProductExtractor<S>,
    retry: RetryPolicy,
}

impl Scraper<ChromeFetcher> {
    /// Launches the browser and builds a scraper from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Launch`] if the browser cannot be started.
    /// This is the only failure that aborts a run.
    pub async fn start(config: &AppConfig) -> Result<Self, ScrapeError> {
        let fetcher = ChromeFetcher::launch(FetchSettings::from_config(config)).await?;
        Ok(Self::from_config(Arc::new(fetcher), config))
    }
}

impl<S: PageSource> Scraper<S> {
    pub fn new(source: Arc<S>, settings: ExtractorSettings, retry: RetryPolicy) -> Self {
        Self {
            extractor: ProductExtractor::new(Arc::clone(&source), settings),
            source,
            retry,
        }
    }

    pub fn from_config(source: Arc<S>, config: &AppConfig) -> Self {
        Self::new(
            source,
            ExtractorSettings::from_config(config),
            RetryPolicy::from_secs_f64(config.max_retries, config.retry_base_delay_secs),
        )
    }

    /// Scrapes `url` with retries.
    ///
    /// Expected failures (transient after exhausting retries, or permanent)
    /// are logged and yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the error only for unclassified failures.
    pub async fn scrape_one(&self, url: &str) -> Result<Option<ProductRecord>, ScrapeError> {
        tracing::info!(url, "scraping product");
        match self.retry.run(url, || self.extractor.extract(url)).await {
            Ok(record) => {
                tracing::info!(
                    url = %record.source_url,
                    price = record.price,
                    title = %record.title,
                    "scrape succeeded"
                );
                Ok(Some(record))
            }
            Err(e) => match e.kind() {
                FailureKind::Transient => {
                    tracing::warn!(
                        url,
                        max_retries = self.retry.max_retries,
                        error = %e,
                        "scrape failed after retries, skipping"
                    );
                    Ok(None)
                }
                FailureKind::Permanent => {
                    tracing::warn!(url, error = %e, "scrape failed permanently, skipping");
                    Ok(None)
                }
                FailureKind::Unclassified => Err(e),
            },
        }
    }

    /// Scrapes every distinct canonical URL in `urls`, at most
    /// `max_concurrent` at a time.
    ///
    /// Returns only successful records, in completion order. Each URL that
    /// succeeds appears exactly once; failures of any kind skip the URL and
    /// never abort the batch.
    pub async fn scrape_many<I>(&self, urls: I, max_concurrent: usize) -> Vec<ProductRecord>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .into_iter()
            .map(|u| canonicalize(u.as_ref()))
            .filter(|u| seen.insert(u.clone()))
            .collect();

        let results: Vec<(&String, Result<Option<ProductRecord>, ScrapeError>)> =
            stream::iter(&unique)
                .map(|url| {
                    let fut = self.scrape_one(url);
                    async move { (url, fut.await) }
                })
                .buffer_unordered(max_concurrent.max(1))
                .collect()
                .await;

        let mut records = Vec::with_capacity(results.len());
        for (url, result) in results {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "unexpected scrape error, skipping");
                }
            }
        }

        tracing::info!(
            attempted = unique.len(),
            succeeded = records.len(),
            "batch scrape finished"
        );
        records
    }

    /// Releases the shared browser process. Idempotent.
    pub async fn close(&self) {
        self.source.shutdown().await;
    }
}
