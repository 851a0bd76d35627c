//! URL identity: canonical form and the marketplace domain allowlist.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_config::SUPPORTED_DOMAINS;

/// Strips the query string and fragment from `url`, plus surrounding whitespace.
///
/// The result is the deduplication identity of a product URL. Idempotent:
/// `canonicalize(canonicalize(u)) == canonicalize(u)`.
#[must_use]
pub fn canonicalize(url: &str) -> String {
    let trimmed = url.trim();
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    trimmed[..end].to_string()
}

/// Returns `true` if `url` is an absolute http(s) URL whose host is one of
/// [`SUPPORTED_DOMAINS`] or a subdomain of one.
///
/// Malformed strings (no scheme, empty host) are rejected.
#[must_use]
pub fn is_supported_domain(url: &str) -> bool {
    extract_host(url).is_some_and(|host| {
        SUPPORTED_DOMAINS
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    })
}

/// Lower-cased hostname of an http(s) URL, as a browser would resolve it.
///
/// Returns `None` when the URL does not parse, the scheme is not http(s) or
/// there is no host.
pub(crate) fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.trim_end_matches('.');
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

/// A canonical, allow-listed product URL scheduled for scraping.
///
/// The canonical string is the identity: two targets are equal exactly when
/// their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetUrl(String);

impl TargetUrl {
    /// Canonicalizes `raw` and checks it against the domain allowlist.
    ///
    /// Returns `None` for unsupported or malformed URLs.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical = canonicalize(raw);
        is_supported_domain(&canonical).then_some(Self(canonical))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
