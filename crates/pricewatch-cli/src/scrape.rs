//! The `scrape` command: scrape every target, persist the results to history,
//! then mirror them to the optional spreadsheet sink.
//!
//! Per-URL failures never abort the run. Only a browser that cannot be
//! launched or a history file that cannot be written is fatal.

use std::collections::HashSet;
use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use pricewatch_core::{canonicalize, AppConfig, ProductRecord};
use pricewatch_scraper::Scraper;
use pricewatch_store::{HistoryLog, NullSink, RecordSink, TargetListStore, WebhookSink};

/// Outcome of one scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScrapeReport {
    pub attempted: usize,
    pub succeeded: usize,
}

impl fmt::Display for ScrapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scraped {}/{} products",
            self.succeeded, self.attempted
        )
    }
}

/// URLs for this run, canonicalized and deduplicated in first-seen order.
///
/// Explicit `overrides` take precedence over the stored target list.
pub(crate) fn resolve_targets(
    store: &TargetListStore,
    overrides: Vec<String>,
) -> anyhow::Result<Vec<String>> {
    let raw = if overrides.is_empty() {
        store
            .load_all()?
            .into_iter()
            .map(pricewatch_core::TargetUrl::into_string)
            .collect()
    } else {
        overrides
    };

    let mut seen = HashSet::new();
    Ok(raw
        .iter()
        .map(|u| canonicalize(u))
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect())
}

/// Appends `records` to history, then mirrors them to `sink`.
///
/// A sink failure is logged and ignored; history is the source of truth.
/// Returns the number of history rows written.
pub(crate) async fn persist_run(
    history: &HistoryLog,
    sink: &dyn RecordSink,
    records: &[ProductRecord],
    timestamp: NaiveDateTime,
) -> anyhow::Result<usize> {
    let rows = history.append(records, timestamp)?;
    if let Err(e) = sink.save(records, timestamp).await {
        tracing::warn!(error = %e, rows = records.len(), "spreadsheet mirror failed, history is intact");
    }
    Ok(rows)
}

fn build_sink(config: &AppConfig) -> Box<dyn RecordSink> {
    let Some(url) = config.sheet_webhook_url.as_deref() else {
        return Box::new(NullSink);
    };
    match WebhookSink::new(url) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            tracing::warn!(error = %e, "spreadsheet mirror disabled, could not build HTTP client");
            Box::new(NullSink)
        }
    }
}

/// Run timestamp, truncated to whole seconds so every row of the run reads
/// back with the same value.
fn run_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) async fn run_scrape(config: &AppConfig, urls: Vec<String>) -> anyhow::Result<()> {
    let targets = resolve_targets(&TargetListStore::new(&config.targets_path), urls)?;
    if targets.is_empty() {
        tracing::warn!(path = %config.targets_path.display(), "no URLs to process");
        println!("no URLs to process; run `pricewatch discover <KEYWORD>` or pass --url");
        return Ok(());
    }

    let scraper = Scraper::start(config).await?;
    let records = scraper
        .scrape_many(&targets, config.max_concurrent_fetches)
        .await;
    scraper.close().await;

    let report = ScrapeReport {
        attempted: targets.len(),
        succeeded: records.len(),
    };
    tracing::info!(attempted = report.attempted, succeeded = report.succeeded, "scrape run finished");

    let sink = build_sink(config);
    persist_run(
        &HistoryLog::new(&config.history_path),
        sink.as_ref(),
        &records,
        run_timestamp(),
    )
    .await?;

    println!("{report}");
    for record in &records {
        println!(
            "  {:>12} {}  {}",
            record.price, record.currency, record.title
        );
    }
    Ok(())
}
