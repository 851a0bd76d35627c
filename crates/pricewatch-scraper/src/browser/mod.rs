//! Headless Chromium page source.
//!
//! One browser process is launched per run. Every opened page gets its own
//! browser context (separate cookies and storage) and a single page inside it; both
//! are disposed when the page handle is closed or dropped.

pub mod stealth;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, FrameId, NavigateParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use pricewatch_core::AppConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::ScrapeError;
use crate::page::{PageHandle, PageSource};

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long to wait for the main document's response event after
/// `Page.navigate` has returned.
const RESPONSE_EVENT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Bound on `Page.navigate`.
    pub nav_timeout: Duration,
    /// Bound on the wait for the ready selector after navigation.
    pub content_wait: Duration,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(30),
            content_wait: Duration::from_secs(10),
            headless: true,
            chrome_path: None,
        }
    }
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            nav_timeout: Duration::from_millis(config.nav_timeout_ms),
            content_wait: Duration::from_millis(config.content_wait_ms),
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
        }
    }
}

/// [`PageSource`] backed by a single Chromium process.
pub struct ChromeFetcher {
    browser: Mutex<Option<Arc<Browser>>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    settings: FetchSettings,
}

impl ChromeFetcher {
    /// Launches Chromium and starts driving its CDP event loop.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Launch`] if the browser config is invalid or
    /// the process cannot be started.
    pub async fn launch(settings: FetchSettings) -> Result<Self, ScrapeError> {
        let (width, height) = stealth::VIEWPORT;
        let mut builder = LAUNCH_ARGS
            .iter()
            .fold(BrowserConfig::builder(), |b, arg| b.arg(*arg))
            .window_size(width, height)
            .request_timeout(settings.nav_timeout + settings.content_wait);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::info!(headless = settings.headless, "browser launched");
        Ok(Self {
            browser: Mutex::new(Some(Arc::new(browser))),
            handler: Mutex::new(Some(handler_task)),
            settings,
        })
    }

    async fn browser(&self) -> Result<Arc<Browser>, ScrapeError> {
        self.browser
            .lock()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(ScrapeError::Closed)
    }

    /// Opens a blank page inside a fresh browser context and applies the
    /// stealth overrides to it.
    async fn open_page(&self, browser: Arc<Browser>) -> Result<ChromePage, ScrapeError> {
        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(cdp_error)?
            .result
            .browser_context_id;

        let target = match CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
        {
            Ok(target) => target,
            Err(e) => {
                release_parts(None, Some(context), &browser).await;
                return Err(ScrapeError::Browser(e));
            }
        };

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                release_parts(None, Some(context), &browser).await;
                return Err(cdp_error(e));
            }
        };

        let mut chrome_page = ChromePage {
            page: Some(page),
            context: Some(context),
            browser,
            nav_timeout: self.settings.nav_timeout,
            content_wait: self.settings.content_wait,
        };
        let applied = match chrome_page.page() {
            Ok(page) => stealth::apply(page, stealth::pick_user_agent()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            chrome_page.release().await;
            return Err(e);
        }
        Ok(chrome_page)
    }
}

#[async_trait]
impl PageSource for ChromeFetcher {
    async fn open(&self) -> Result<Box<dyn PageHandle>, ScrapeError> {
        let browser = self.browser().await?;
        Ok(Box::new(self.open_page(browser).await?))
    }

    async fn shutdown(&self) {
        let browser = self.browser.lock().await.take();
        if let Some(browser) = browser {
            match Arc::try_unwrap(browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        tracing::warn!(error = %e, "browser close error");
                    }
                    if let Err(e) = browser.wait().await {
                        tracing::debug!(error = %e, "browser wait error");
                    }
                }
                Err(_) => {
                    tracing::warn!("browser still referenced by open pages; dropping handle");
                }
            }
        }
        if let Some(task) = self.handler.lock().await.take() {
            task.abort();
        }
    }
}

/// A page plus the browser context that owns it.
struct ChromePage {
    page: Option<Page>,
    context: Option<BrowserContextId>,
    browser: Arc<Browser>,
    nav_timeout: Duration,
    content_wait: Duration,
}

impl ChromePage {
    fn page(&self) -> Result<&Page, ScrapeError> {
        self.page.as_ref().ok_or(ScrapeError::Closed)
    }

    async fn wait_ready(&self, page: &Page, url: &str, ready_selector: &str) -> Result<(), ScrapeError> {
        let poll = async {
            loop {
                match page.find_elements(ready_selector).await {
                    Ok(found) if !found.is_empty() => break,
                    Ok(_) => {}
                    Err(e) => tracing::debug!(url, error = %e, "ready selector query failed"),
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.content_wait, poll)
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: url.to_owned(),
                timeout_ms: millis(self.content_wait),
            })
    }

    async fn release(&mut self) {
        release_parts(self.page.take(), self.context.take(), &self.browser).await;
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if self.page.is_none() && self.context.is_none() {
            return;
        }
        let page = self.page.take();
        let context = self.context.take();
        let browser = Arc::clone(&self.browser);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                release_parts(page, context, &browser).await;
            });
        }
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    async fn goto(&self, url: &str, ready_selector: &str) -> Result<(), ScrapeError> {
        let page = self.page()?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(cdp_error)?;

        let nav_timeout_ms = millis(self.nav_timeout);
        let navigated = tokio::time::timeout(self.nav_timeout, page.execute(NavigateParams::new(url)))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: url.to_owned(),
                timeout_ms: nav_timeout_ms,
            })?
            .map_err(|e| navigation_error(url, e, nav_timeout_ms))?
            .result;

        if let Some(reason) = navigated.error_text {
            return Err(ScrapeError::Network {
                url: url.to_owned(),
                reason,
            });
        }

        if let Some(status) = document_status(&mut responses, &navigated.frame_id).await {
            check_status(url, status)?;
        }

        self.wait_ready(page, url, ready_selector).await
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        let elements = self.page()?.find_elements(selector).await.map_err(cdp_error)?;
        match elements.first() {
            Some(el) => el.inner_text().await.map_err(cdp_error),
            None => Ok(None),
        }
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScrapeError> {
        let elements = self.page()?.find_elements(selector).await.map_err(cdp_error)?;
        match elements.first() {
            Some(el) => el.attribute(name).await.map_err(cdp_error),
            None => Ok(None),
        }
    }

    async fn card_links(&self, card_selector: &str) -> Result<Vec<Vec<String>>, ScrapeError> {
        let cards = self
            .page()?
            .find_elements(card_selector)
            .await
            .map_err(cdp_error)?;

        let mut links = Vec::with_capacity(cards.len());
        for card in &cards {
            let anchors = card.find_elements("a").await.map_err(cdp_error)?;
            let mut hrefs = Vec::with_capacity(anchors.len());
            for anchor in &anchors {
                if let Some(href) = anchor.attribute("href").await.map_err(cdp_error)? {
                    hrefs.push(href);
                }
            }
            links.push(hrefs);
        }
        Ok(links)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScrapeError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page()?
            .save_screenshot(params, path)
            .await
            .map(|_| ())
            .map_err(cdp_error)
    }

    async fn close(mut self: Box<Self>) {
        self.release().await;
    }
}

async fn release_parts(page: Option<Page>, context: Option<BrowserContextId>, browser: &Browser) {
    if let Some(page) = page {
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close error");
        }
    }
    if let Some(context) = context {
        if let Err(e) = browser
            .execute(DisposeBrowserContextParams::new(context))
            .await
        {
            tracing::debug!(error = %e, "browser context dispose error");
        }
    }
}

/// Waits briefly for the response event of the main document in `frame_id`.
async fn document_status(
    responses: &mut EventStream<EventResponseReceived>,
    frame_id: &FrameId,
) -> Option<i64> {
    let find = async {
        while let Some(event) = responses.next().await {
            if event.r#type == ResourceType::Document && event.frame_id.as_ref() == Some(frame_id) {
                return Some(event.response.status);
            }
        }
        None
    };
    tokio::time::timeout(RESPONSE_EVENT_WAIT, find)
        .await
        .ok()
        .flatten()
}

/// Maps a main-document HTTP status onto the error taxonomy.
fn check_status(url: &str, status: i64) -> Result<(), ScrapeError> {
    match status {
        404 => Err(ScrapeError::NotFound {
            url: url.to_owned(),
        }),
        500.. => Err(ScrapeError::HttpServer {
            status: u16::try_from(status).unwrap_or(u16::MAX),
            url: url.to_owned(),
        }),
        _ => Ok(()),
    }
}

fn navigation_error(url: &str, err: CdpError, timeout_ms: u64) -> ScrapeError {
    match err {
        CdpError::Timeout => ScrapeError::NavigationTimeout {
            url: url.to_owned(),
            timeout_ms,
        },
        other => cdp_error(other),
    }
}

pub(crate) fn cdp_error(err: CdpError) -> ScrapeError {
    ScrapeError::Browser(err.to_string())
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.mercadolibre.com.ar/p/MLA1";

    #[test]
    fn status_404_is_not_found() {
        assert!(matches!(
            check_status(URL, 404),
            Err(ScrapeError::NotFound { .. })
        ));
    }

    #[test]
    fn status_5xx_is_server_error() {
        assert!(matches!(
            check_status(URL, 503),
            Err(ScrapeError::HttpServer { status: 503, .. })
        ));
        assert!(matches!(
            check_status(URL, 500),
            Err(ScrapeError::HttpServer { status: 500, .. })
        ));
    }

    #[test]
    fn other_statuses_pass() {
        for status in [200, 204, 301, 403, 410] {
            assert!(check_status(URL, status).is_ok(), "{status}");
        }
    }

    #[test]
    fn cdp_timeout_during_navigation_is_transient() {
        let err = navigation_error(URL, CdpError::Timeout, 30_000);
        assert!(matches!(
            err,
            ScrapeError::NavigationTimeout {
                timeout_ms: 30_000,
                ..
            }
        ));
    }

    #[test]
    fn settings_follow_config() {
        let mut config = AppConfig::default();
        config.nav_timeout_ms = 5_000;
        config.content_wait_ms = 1_500;
        config.headless = false;
        let settings = FetchSettings::from_config(&config);
        assert_eq!(settings.nav_timeout, Duration::from_secs(5));
        assert_eq!(settings.content_wait, Duration::from_millis(1_500));
        assert!(!settings.headless);
    }

    /// Requires a local Chromium install and network access.
    #[tokio::test]
    #[ignore = "launches a real browser against the live marketplace"]
    async fn live_page_reads_body_text() {
        let fetcher = ChromeFetcher::launch(FetchSettings::default())
            .await
            .expect("launch");
        let page = fetcher.open().await.expect("open");
        page.goto("https://www.mercadolibre.com.ar/", "body")
            .await
            .expect("goto");
        let body = page.inner_text("body").await.expect("query");
        assert!(body.is_some());
        page.close().await;
        fetcher.shutdown().await;
    }
}
