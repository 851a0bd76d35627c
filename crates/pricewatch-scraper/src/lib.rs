pub mod browser;
pub mod discover;
pub mod error;
pub mod extract;
pub mod page;
pub mod price;
pub mod retry;
pub mod scraper;
pub mod selector;

pub use browser::{ChromeFetcher, FetchSettings};
pub use discover::{collect_product_links, keyword_slug, listing_url, Discoverer};
pub use error::{FailureKind, ScrapeError};
pub use extract::{screenshot_file_name, ExtractorSettings, ProductExtractor};
pub use page::{PageHandle, PageSource};
pub use price::parse_price;
pub use retry::{RetryDecision, RetryPolicy};
pub use scraper::Scraper;
pub use selector::{resolve, ExtractMode};
