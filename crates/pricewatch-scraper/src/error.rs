use thiserror::Error;

/// Retry classification of a [`ScrapeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Plausibly succeeds on a later attempt (timeouts, network, 5xx).
    Transient,
    /// Deterministic; retrying returns the same result.
    Permanent,
    /// Not part of the known taxonomy. Never retried; triggers a diagnostic
    /// screenshot when a page is available.
    Unclassified,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unsupported domain: {url}")]
    UnsupportedDomain { url: String },

    #[error("page not found (HTTP 404): {url}")]
    NotFound { url: String },

    #[error("server error (HTTP {status}) from {url}")]
    HttpServer { status: u16, url: String },

    #[error("timed out after {timeout_ms}ms waiting for {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("product {field} not found on {url}")]
    ProductNotFound { url: String, field: &'static str },

    #[error("malformed price text \"{raw}\"")]
    MalformedPrice { raw: String },

    #[error("browser protocol error: {0}")]
    Browser(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("browser session is closed")]
    Closed,
}

impl ScrapeError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::NavigationTimeout { .. }
            | ScrapeError::Network { .. }
            | ScrapeError::HttpServer { .. } => FailureKind::Transient,
            ScrapeError::UnsupportedDomain { .. }
            | ScrapeError::NotFound { .. }
            | ScrapeError::ProductNotFound { .. }
            | ScrapeError::MalformedPrice { .. } => FailureKind::Permanent,
            ScrapeError::Browser(_) | ScrapeError::Launch(_) | ScrapeError::Closed => {
                FailureKind::Unclassified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_level_failures_are_transient() {
        let errors = [
            ScrapeError::NavigationTimeout {
                url: "u".to_owned(),
                timeout_ms: 10,
            },
            ScrapeError::Network {
                url: "u".to_owned(),
                reason: "net::ERR_CONNECTION_RESET".to_owned(),
            },
            ScrapeError::HttpServer {
                status: 503,
                url: "u".to_owned(),
            },
        ];
        for err in errors {
            assert_eq!(err.kind(), FailureKind::Transient, "{err}");
        }
    }

    #[test]
    fn deterministic_failures_are_permanent() {
        let errors = [
            ScrapeError::UnsupportedDomain { url: "u".to_owned() },
            ScrapeError::NotFound { url: "u".to_owned() },
            ScrapeError::ProductNotFound {
                url: "u".to_owned(),
                field: "price",
            },
            ScrapeError::MalformedPrice { raw: "n/a".to_owned() },
        ];
        for err in errors {
            assert_eq!(err.kind(), FailureKind::Permanent, "{err}");
        }
    }

    #[test]
    fn protocol_failures_are_unclassified() {
        assert_eq!(
            ScrapeError::Browser("target crashed".to_owned()).kind(),
            FailureKind::Unclassified
        );
        assert_eq!(ScrapeError::Closed.kind(), FailureKind::Unclassified);
    }
}
