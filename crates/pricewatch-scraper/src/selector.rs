//! Ordered selector fallback.

use crate::page::PageHandle;

/// What to read from a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode<'a> {
    Text,
    Attribute(&'a str),
}

/// Tries `selectors` strictly in order and returns the first extracted value.
///
/// A selector wins only if it matches an element and that element yields a
/// non-blank value. No match, a blank value, or a query error all mean "try
/// the next one"; only exhausting the list returns `None`.
pub async fn resolve<P>(page: &P, selectors: &[String], mode: ExtractMode<'_>) -> Option<String>
where
    P: PageHandle + ?Sized,
{
    for selector in selectors {
        let extracted = match mode {
            ExtractMode::Text => page.inner_text(selector).await,
            ExtractMode::Attribute(name) => page.attribute(selector, name).await,
        };
        match extracted {
            Ok(Some(value)) if !value.trim().is_empty() => return Some(value),
            Ok(_) => {
                tracing::debug!(selector, "selector yielded nothing, trying next");
            }
            Err(e) => {
                tracing::debug!(selector, error = %e, "selector query failed, trying next");
            }
        }
    }
    None
}
