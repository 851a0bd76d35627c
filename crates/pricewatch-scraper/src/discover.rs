//! Keyword search against the marketplace listing pages.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pricewatch_core::{canonicalize, SelectorConfig, TargetUrl, LISTING_BASE_URL};
use regex::Regex;
use url::Url;

use crate::page::{PageHandle, PageSource};

/// Links to real product pages, as opposed to category or seller pages.
static PRODUCT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(/p/|articulo\.mercadolibre\.)").expect("valid product link regex")
});

/// Sponsored results route through click-tracking redirects.
static AD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(click1|/mclics/)").expect("valid ad link regex"));

/// Characters left unescaped in a keyword slug.
const SLUG_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Lower-cased keyword with whitespace runs collapsed to single hyphens and
/// everything else outside `[A-Za-z0-9._-]` percent-encoded.
#[must_use]
pub fn keyword_slug(keyword: &str) -> String {
    let hyphenated = keyword
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    utf8_percent_encode(&hyphenated, SLUG_ENCODE_SET).to_string()
}

#[must_use]
pub fn listing_url(keyword: &str) -> String {
    format!(
        "{}/{}",
        LISTING_BASE_URL.trim_end_matches('/'),
        keyword_slug(keyword)
    )
}

/// Resolves `href` against the listing host and keeps it only when its
/// canonical form is an allowlisted, non-sponsored product page.
fn product_target(href: &str) -> Option<TargetUrl> {
    let base = Url::parse(LISTING_BASE_URL).ok()?;
    let absolute = base.join(href.trim()).ok()?;
    let canonical = canonicalize(absolute.as_str());
    if !PRODUCT_LINK_RE.is_match(&canonical) || AD_LINK_RE.is_match(&canonical) {
        return None;
    }
    TargetUrl::parse(&canonical)
}

/// Picks at most `limit` distinct product URLs from listing cards.
///
/// Cards are visited in order. Relative hrefs resolve against the listing
/// host. From each card the first link whose canonical URL is a product page
/// on an allowlisted domain (and not an ad) is kept if not yet seen.
/// Scanning stops once `limit` URLs are collected.
#[must_use]
pub fn collect_product_links(cards: &[Vec<String>], limit: usize) -> Vec<TargetUrl> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for card in cards {
        if found.len() >= limit {
            break;
        }
        let Some(target) = card.iter().find_map(|href| product_target(href)) else {
            continue;
        };
        if seen.insert(target.clone()) {
            found.push(target);
        }
    }
    found
}

pub struct Discoverer<S> {
    source: Arc<S>,
    selectors: SelectorConfig,
}

impl<S: PageSource> Discoverer<S> {
    pub fn new(source: Arc<S>, selectors: SelectorConfig) -> Self {
        Self { source, selectors }
    }

    /// Searches the listing for `keyword` and returns up to `limit` distinct
    /// canonical product URLs in listing order.
    ///
    /// Never fails: navigation and selector problems are logged and produce
    /// an empty (or short) result.
    pub async fn search(&self, keyword: &str, limit: usize) -> Vec<TargetUrl> {
        if limit == 0 {
            return Vec::new();
        }
        if keyword_slug(keyword).is_empty() {
            tracing::warn!("empty search keyword, nothing to discover");
            return Vec::new();
        }

        let url = listing_url(keyword);
        tracing::info!(keyword, url = %url, limit, "searching listing");

        let page = match self
            .source
            .fetch(&url, &self.selectors.listing_ready())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "listing search failed");
                return Vec::new();
            }
        };

        let found = self.links_on_page(page.as_ref(), limit).await;
        page.close().await;

        tracing::info!(keyword, found = found.len(), "listing search finished");
        found
    }

    /// Tries each listing-card selector in order until one yields cards.
    async fn links_on_page(&self, page: &dyn PageHandle, limit: usize) -> Vec<TargetUrl> {
        for card_selector in &self.selectors.listing_card {
            match page.card_links(card_selector).await {
                Ok(cards) if !cards.is_empty() => return collect_product_links(&cards, limit),
                Ok(_) => tracing::debug!(selector = %card_selector, "no listing cards matched"),
                Err(e) => {
                    tracing::debug!(selector = %card_selector, error = %e, "listing card query failed");
                }
            }
        }
        tracing::warn!("no listing cards found on page");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(hrefs: &[&str]) -> Vec<String> {
        hrefs.iter().map(|h| (*h).to_owned()).collect()
    }

    #[test]
    fn slug_hyphenates_and_lowercases() {
        assert_eq!(keyword_slug("Auriculares Bluetooth"), "auriculares-bluetooth");
        assert_eq!(keyword_slug("  iphone   15  pro "), "iphone-15-pro");
    }

    #[test]
    fn slug_percent_encodes_reserved_characters() {
        assert_eq!(keyword_slug("café & té"), "caf%C3%A9-%26-t%C3%A9");
        assert_eq!(keyword_slug("a/b?c"), "a%2Fb%3Fc");
    }

    #[test]
    fn listing_url_joins_base_and_slug() {
        assert_eq!(
            listing_url("smart tv 50"),
            "https://listado.mercadolibre.com.ar/smart-tv-50"
        );
    }

    #[test]
    fn takes_first_product_link_in_each_card() {
        let cards = vec![card(&[
            "https://www.mercadolibre.com.ar/ofertas",
            "https://www.mercadolibre.com.ar/samsung-tv/p/MLA1?pdp_filters=x",
            "https://www.mercadolibre.com.ar/samsung-tv/p/MLA9",
        ])];
        let found = collect_product_links(&cards, 5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_str(), "https://www.mercadolibre.com.ar/samsung-tv/p/MLA1");
    }

    #[test]
    fn skips_sponsored_links() {
        let cards = vec![
            card(&["https://click1.mercadolibre.com.ar/mclics/clicks/external/MLA/p/MLA1"]),
            card(&["https://articulo.mercadolibre.com.ar/MLA-123-heladera-_JM#position=2"]),
        ];
        let found = collect_product_links(&cards, 5);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].as_str(),
            "https://articulo.mercadolibre.com.ar/MLA-123-heladera-_JM"
        );
    }

    #[test]
    fn deduplicates_by_canonical_url_and_respects_limit() {
        let cards: Vec<Vec<String>> = (0..10)
            .map(|i| {
                let id = i / 2;
                card(&[format!(
                    "https://www.mercadolibre.com.ar/item/p/MLA{id}?tracking_id={i}"
                )
                .as_str()])
            })
            .collect();

        let found = collect_product_links(&cards, 3);
        assert_eq!(found.len(), 3);
        let unique: HashSet<_> = found.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(found[0].as_str(), "https://www.mercadolibre.com.ar/item/p/MLA0");
        assert_eq!(found[2].as_str(), "https://www.mercadolibre.com.ar/item/p/MLA2");
    }

    #[test]
    fn drops_product_links_on_foreign_domains() {
        let cards = vec![card(&["https://www.amazon.com/p/B000"])];
        assert!(collect_product_links(&cards, 5).is_empty());
    }

    #[test]
    fn relative_links_resolve_against_listing_host() {
        let cards = vec![card(&["/samsung-tv/p/MLA5?searchVariation=1"])];
        let found = collect_product_links(&cards, 5);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].as_str(),
            "https://listado.mercadolibre.com.ar/samsung-tv/p/MLA5"
        );
    }

    #[test]
    fn product_pattern_in_query_string_is_not_a_product() {
        let cards = vec![card(&[
            "https://www.mercadolibre.com.ar/ofertas?from=/p/MLA9",
            "https://www.mercadolibre.com.ar/tv/p/MLA3",
        ])];
        let found = collect_product_links(&cards, 5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_str(), "https://www.mercadolibre.com.ar/tv/p/MLA3");
    }

    #[test]
    fn unusable_first_link_falls_through_to_next_anchor() {
        let cards = vec![card(&[
            "https://www.amazon.com/p/B000",
            "https://articulo.mercadolibre.com.ar/MLA-7-silla-_JM",
        ])];
        let found = collect_product_links(&cards, 5);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].as_str(),
            "https://articulo.mercadolibre.com.ar/MLA-7-silla-_JM"
        );
    }

    #[test]
    fn cards_without_product_links_are_ignored() {
        let cards = vec![card(&[]), card(&["https://www.mercadolibre.com.ar/tiendas"])];
        assert!(collect_product_links(&cards, 5).is_empty());
    }
}
