//! Read-and-reset commands over the target list, history and activity log.

use pricewatch_core::{AppConfig, HistoryEntry};
use pricewatch_store::{tail_lines, HistoryLog, HistorySummary, TargetListStore};

/// Printed by `pricewatch log` before anything has been logged.
pub(crate) const EMPTY_LOG_PLACEHOLDER: &str = "Esperando actividad...";

pub(crate) fn list_targets(config: &AppConfig) -> anyhow::Result<()> {
    let urls = TargetListStore::new(&config.targets_path).load_all()?;
    if urls.is_empty() {
        println!("target list is empty");
        return Ok(());
    }
    for url in &urls {
        println!("{}", url.as_str());
    }
    println!("{} targets", urls.len());
    Ok(())
}

pub(crate) fn clear_targets(config: &AppConfig) -> anyhow::Result<()> {
    TargetListStore::new(&config.targets_path).clear()?;
    tracing::info!(path = %config.targets_path.display(), "target list cleared");
    println!("target list cleared");
    Ok(())
}

pub(crate) fn show_history(config: &AppConfig) -> anyhow::Result<()> {
    let latest = HistoryLog::new(&config.history_path).latest_snapshot()?;
    match HistorySummary::from_entries(&latest) {
        Some(summary) => {
            for line in summary_lines(&summary) {
                println!("{line}");
            }
            println!();
            for entry in &latest {
                println!("{}", entry_line(entry));
            }
        }
        None => println!("no price history yet"),
    }
    Ok(())
}

pub(crate) fn clear_history(config: &AppConfig) -> anyhow::Result<()> {
    HistoryLog::new(&config.history_path).clear()?;
    tracing::info!(path = %config.history_path.display(), "price history cleared");
    println!("price history cleared");
    Ok(())
}

pub(crate) fn show_log(config: &AppConfig, lines: usize) -> anyhow::Result<()> {
    let tail = tail_lines(&config.activity_log_path, lines)?;
    for line in or_placeholder(tail) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn summary_lines(summary: &HistorySummary) -> Vec<String> {
    vec![
        format!("products tracked: {}", summary.tracked),
        format!("average price:    $ {}", summary.average_price),
        format!("best price:       $ {}", summary.lowest_price),
        format!(
            "last update:      {}",
            summary.updated_at.format("%Y-%m-%d %H:%M:%S")
        ),
    ]
}

fn entry_line(entry: &HistoryEntry) -> String {
    format!(
        "{:>12} {}  {}  {}",
        entry.price, entry.currency, entry.title, entry.source_url
    )
}

pub(crate) fn or_placeholder(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec![EMPTY_LOG_PLACEHOLDER.to_string()]
    } else {
        lines
    }
}
