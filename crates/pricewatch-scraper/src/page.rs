//! Seams between extraction logic and the browser.
//!
//! [`PageSource`] opens one isolated page at a time; [`PageHandle`] navigates
//! it and answers read-only DOM queries. The Chromium implementation lives in
//! [`crate::browser`]; tests substitute in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ScrapeError;

#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to `url` and wait until an element matching
    /// `ready_selector` is present.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::NotFound`] for HTTP 404.
    /// - [`ScrapeError::HttpServer`] for HTTP 5xx.
    /// - [`ScrapeError::NavigationTimeout`] if navigation or the ready wait
    ///   exceeds its timeout.
    /// - [`ScrapeError::Network`] for connection-level failures.
    async fn goto(&self, url: &str, ready_selector: &str) -> Result<(), ScrapeError>;

    /// Rendered text of the first element matching `selector`, or `None`
    /// when nothing matches.
    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ScrapeError>;

    /// Value of attribute `name` on the first element matching `selector`.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScrapeError>;

    /// For every element matching `card_selector`, in document order, the
    /// `href` values of the anchors it contains, also in document order.
    async fn card_links(&self, card_selector: &str) -> Result<Vec<Vec<String>>, ScrapeError>;

    /// Write a PNG screenshot of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), ScrapeError>;

    /// Tear down the page and its browsing context. Must be called on every
    /// exit path; implementations also release on drop as a fallback.
    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// A blank page in a fresh, isolated browsing context.
    async fn open(&self) -> Result<Box<dyn PageHandle>, ScrapeError>;

    /// Opens a page and navigates it to `url`. The page is closed again if
    /// navigation fails.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::open`] or [`PageHandle::goto`].
    async fn fetch(
        &self,
        url: &str,
        ready_selector: &str,
    ) -> Result<Box<dyn PageHandle>, ScrapeError> {
        let page = self.open().await?;
        match page.goto(url, ready_selector).await {
            Ok(()) => Ok(page),
            Err(e) => {
                page.close().await;
                Err(e)
            }
        }
    }

    /// Release the underlying browser process. Idempotent.
    async fn shutdown(&self);
}
