//! Integration tests for `Discoverer::search` over an in-memory page source.

mod support;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use pricewatch_core::SelectorConfig;
use pricewatch_scraper::{listing_url, Discoverer};

use support::{Behavior, FakeSource};

fn listing(cards: Vec<Vec<&str>>) -> Behavior {
    Behavior::Listing(
        cards
            .into_iter()
            .map(|card| card.into_iter().map(str::to_owned).collect())
            .collect(),
    )
}

fn discoverer(source: FakeSource) -> (Discoverer<FakeSource>, Arc<FakeSource>) {
    let source = Arc::new(source);
    (
        Discoverer::new(Arc::clone(&source), SelectorConfig::default()),
        source,
    )
}

#[tokio::test]
async fn search_returns_at_most_limit_distinct_urls() {
    let cards: Vec<Vec<String>> = (0..12)
        .map(|i| {
            vec![format!(
                "https://www.mercadolibre.com.ar/auriculares/p/MLA{}?searchVariation={i}",
                i % 4
            )]
        })
        .collect();
    let (discoverer, source) = discoverer(
        FakeSource::new().with(&listing_url("auriculares"), Behavior::Listing(cards)),
    );

    let found = discoverer.search("auriculares", 5).await;

    assert_eq!(found.len(), 4, "only four distinct products on the page");
    let unique: HashSet<_> = found.iter().collect();
    assert_eq!(unique.len(), found.len());
    assert!(found.iter().all(|u| !u.as_str().contains('?')));
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_stops_once_limit_is_reached() {
    let cards: Vec<Vec<String>> = (0..30)
        .map(|i| vec![format!("https://www.mercadolibre.com.ar/silla/p/MLA{i}")])
        .collect();
    let (discoverer, _) =
        discoverer(FakeSource::new().with(&listing_url("silla gamer"), Behavior::Listing(cards)));

    let found = discoverer.search("silla gamer", 5).await;

    let urls: Vec<&str> = found.iter().map(|u| u.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.mercadolibre.com.ar/silla/p/MLA0",
            "https://www.mercadolibre.com.ar/silla/p/MLA1",
            "https://www.mercadolibre.com.ar/silla/p/MLA2",
            "https://www.mercadolibre.com.ar/silla/p/MLA3",
            "https://www.mercadolibre.com.ar/silla/p/MLA4",
        ]
    );
}

#[tokio::test]
async fn search_skips_ads_and_non_product_links() {
    let (discoverer, _) = discoverer(FakeSource::new().with(
        &listing_url("cafetera"),
        listing(vec![
            vec!["https://click1.mercadolibre.com.ar/mclics/clicks/external/MLA/count?a=1"],
            vec![
                "https://www.mercadolibre.com.ar/tienda/oster",
                "https://articulo.mercadolibre.com.ar/MLA-111-cafetera-oster-_JM",
            ],
            vec!["https://www.mercadolibre.com.ar/ayuda"],
        ]),
    ));

    let found = discoverer.search("cafetera", 5).await;

    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].as_str(),
        "https://articulo.mercadolibre.com.ar/MLA-111-cafetera-oster-_JM"
    );
}

#[tokio::test]
async fn navigation_failure_returns_empty() {
    let (discoverer, source) =
        discoverer(FakeSource::new().with(&listing_url("tv"), Behavior::Timeout));

    let found = discoverer.search("tv", 5).await;

    assert!(found.is_empty());
    assert_eq!(
        source.stats.opened.load(Ordering::SeqCst),
        source.stats.closed.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn listing_without_cards_returns_empty() {
    let (discoverer, _) = discoverer(FakeSource::new().with(&listing_url("xyz"), listing(vec![])));
    assert!(discoverer.search("xyz", 5).await.is_empty());
}

#[tokio::test]
async fn zero_limit_or_blank_keyword_skips_the_browser() {
    let (discoverer, source) = discoverer(FakeSource::new());

    assert!(discoverer.search("tv", 0).await.is_empty());
    assert!(discoverer.search("   ", 5).await.is_empty());
    assert_eq!(source.stats.opened.load(Ordering::SeqCst), 0);
}
