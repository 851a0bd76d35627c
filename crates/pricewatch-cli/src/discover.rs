//! The `discover` command: keyword search feeding the target list.

use std::sync::Arc;

use pricewatch_core::AppConfig;
use pricewatch_scraper::{keyword_slug, ChromeFetcher, Discoverer, FetchSettings, PageSource};
use pricewatch_store::{MergePolicy, TargetListStore};

pub(crate) async fn run_discover(
    config: &AppConfig,
    keyword: &str,
    limit: usize,
    replace: bool,
) -> anyhow::Result<()> {
    if keyword_slug(keyword).is_empty() {
        println!("nothing to search: the keyword is blank");
        return Ok(());
    }

    let fetcher = Arc::new(ChromeFetcher::launch(FetchSettings::from_config(config)).await?);
    let discoverer = Discoverer::new(Arc::clone(&fetcher), config.selectors.clone());
    let found = discoverer.search(keyword, limit).await;
    fetcher.shutdown().await;

    if found.is_empty() {
        println!("no products found for \"{keyword}\"");
        return Ok(());
    }

    let policy = if replace {
        MergePolicy::Replace
    } else {
        MergePolicy::Append
    };
    let store = TargetListStore::new(&config.targets_path);
    let added = store.merge(&found, policy)?;
    tracing::info!(keyword, found = found.len(), added, ?policy, "target list updated");

    println!("added {added} of {} products found for \"{keyword}\"", found.len());
    for url in &found {
        println!("  {}", url.as_str());
    }
    Ok(())
}
