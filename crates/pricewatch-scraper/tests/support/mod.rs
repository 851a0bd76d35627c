//! In-memory page source for exercising the scrape pipeline without a
//! browser.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_scraper::{PageHandle, PageSource, ScrapeError};

/// How a URL responds to navigation.
#[derive(Debug, Clone)]
pub enum Behavior {
    Product { title: String, price: String },
    /// Page loads but has no title or price element.
    EmptyPage,
    /// Page loads; every DOM query fails with a protocol error.
    BrokenPage,
    Listing(Vec<Vec<String>>),
    Timeout,
    NotFound,
    ServerError,
    /// The renderer dies mid-navigation.
    Crash,
    /// Times out on the first `n` navigations, then behaves like the inner
    /// value.
    FlakyThen(usize, Box<Behavior>),
}

#[derive(Default)]
pub struct Stats {
    active: AtomicUsize,
    max_active: AtomicUsize,
    navigations: Mutex<HashMap<String, usize>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub screenshots: Mutex<Vec<PathBuf>>,
    pub shutdowns: AtomicUsize,
}

impl Stats {
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_navigations(&self) -> usize {
        self.navigations.lock().unwrap().values().sum()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.screenshots.lock().unwrap().clone()
    }

    fn record_navigation(&self, url: &str) -> usize {
        let mut navigations = self.navigations.lock().unwrap();
        let count = navigations.entry(url.to_owned()).or_insert(0);
        *count += 1;
        *count
    }
}

pub struct FakeSource {
    behaviors: Arc<HashMap<String, Behavior>>,
    latency: Duration,
    pub stats: Arc<Stats>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            behaviors: Arc::new(HashMap::new()),
            latency: Duration::from_millis(5),
            stats: Arc::new(Stats::default()),
        }
    }

    pub fn with(mut self, url: &str, behavior: Behavior) -> Self {
        Arc::make_mut(&mut self.behaviors).insert(url.to_owned(), behavior);
        self
    }

    pub fn with_product(self, url: &str, title: &str, price: &str) -> Self {
        self.with(
            url,
            Behavior::Product {
                title: title.to_owned(),
                price: price.to_owned(),
            },
        )
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn open(&self) -> Result<Box<dyn PageHandle>, ScrapeError> {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_active.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            behaviors: Arc::clone(&self.behaviors),
            latency: self.latency,
            loaded: Mutex::new(None),
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn shutdown(&self) {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakePage {
    behaviors: Arc<HashMap<String, Behavior>>,
    latency: Duration,
    loaded: Mutex<Option<Behavior>>,
    stats: Arc<Stats>,
}

impl FakePage {
    fn loaded(&self) -> Option<Behavior> {
        self.loaded.lock().unwrap().clone()
    }
}

/// Unwraps `FlakyThen` layers for navigation number `attempt` (1-based).
fn effective(mut behavior: Behavior, attempt: usize) -> Behavior {
    loop {
        match behavior {
            Behavior::FlakyThen(failures, next) => {
                if attempt <= failures {
                    return Behavior::Timeout;
                }
                behavior = *next;
            }
            other => return other,
        }
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn goto(&self, url: &str, _ready_selector: &str) -> Result<(), ScrapeError> {
        let attempt = self.stats.record_navigation(url);
        tokio::time::sleep(self.latency).await;

        let behavior = match self.behaviors.get(url) {
            Some(b) => effective(b.clone(), attempt),
            None => Behavior::NotFound,
        };
        match behavior {
            Behavior::Timeout => Err(ScrapeError::NavigationTimeout {
                url: url.to_owned(),
                timeout_ms: 30_000,
            }),
            Behavior::NotFound => Err(ScrapeError::NotFound {
                url: url.to_owned(),
            }),
            Behavior::ServerError => Err(ScrapeError::HttpServer {
                status: 503,
                url: url.to_owned(),
            }),
            Behavior::Crash => Err(ScrapeError::Browser("target crashed".to_owned())),
            loaded => {
                *self.loaded.lock().unwrap() = Some(loaded);
                Ok(())
            }
        }
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        match self.loaded() {
            Some(Behavior::Product { title, price }) => Ok(match selector {
                "h1.ui-pdp-title" => Some(title),
                ".andes-money-amount__fraction" => Some(price),
                _ => None,
            }),
            Some(Behavior::BrokenPage) => Err(ScrapeError::Browser("node detached".to_owned())),
            _ => Ok(None),
        }
    }

    async fn attribute(&self, _selector: &str, _name: &str) -> Result<Option<String>, ScrapeError> {
        Ok(None)
    }

    async fn card_links(&self, card_selector: &str) -> Result<Vec<Vec<String>>, ScrapeError> {
        match self.loaded() {
            Some(Behavior::Listing(cards)) if card_selector == "li.ui-search-layout__item" => {
                Ok(cards)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScrapeError> {
        self.stats.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn product_url(id: usize) -> String {
    format!("https://www.mercadolibre.com.ar/producto/p/MLA{id}")
}
