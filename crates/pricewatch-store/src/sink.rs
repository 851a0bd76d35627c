//! Optional mirror of scrape results to an external spreadsheet.
//!
//! The local history log is the source of truth; a sink only receives a copy
//! after the history append has completed, and its failures are warnings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use pricewatch_core::ProductRecord;
use reqwest::Client;
use serde::Serialize;

use crate::error::SinkError;

const SINK_TIMEOUT: Duration = Duration::from_secs(30);
const SINK_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Mirrors `records`, all scraped at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the destination cannot be reached or refuses
    /// the rows.
    async fn save(&self, records: &[ProductRecord], timestamp: NaiveDateTime)
        -> Result<(), SinkError>;
}

/// Sink used when no destination is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl RecordSink for NullSink {
    async fn save(&self, _records: &[ProductRecord], _timestamp: NaiveDateTime) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SheetRows<'a> {
    /// `[fecha, producto, precio, moneda, url]`, the spreadsheet's column order.
    rows: Vec<(String, &'a str, u64, &'a str, &'a str)>,
}

/// Posts rows as JSON to a spreadsheet web-app endpoint.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    /// # Errors
    ///
    /// Returns [`SinkError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(SINK_TIMEOUT)
            .connect_timeout(SINK_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RecordSink for WebhookSink {
    async fn save(&self, records: &[ProductRecord], timestamp: NaiveDateTime) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }
        let fecha = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let body = SheetRows {
            rows: records
                .iter()
                .map(|r| {
                    (
                        fecha.clone(),
                        r.title.as_str(),
                        r.price,
                        r.currency.as_str(),
                        r.source_url.as_str(),
                    )
                })
                .collect(),
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                rows: records.len(),
            });
        }

        tracing::info!(rows = records.len(), "rows mirrored to spreadsheet");
        Ok(())
    }
}
