use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A product page successfully reduced to its title and price.
///
/// Built only by the extractor after every field validated, so a record in
/// hand always has a non-empty trimmed title and a canonical source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// Whole currency units; the marketplace never displays fractions.
    pub price: u64,
    /// Canonical URL (no query string or fragment).
    pub source_url: String,
    /// Fixed currency code, see [`crate::CURRENCY_CODE`].
    pub currency: String,
}

/// One row of the price-history log.
///
/// Column names match the log file header (`fecha,producto,precio,url,moneda`)
/// so existing history files remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "fecha", with = "history_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "producto")]
    pub title: String,
    #[serde(rename = "precio")]
    pub price: u64,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "moneda")]
    pub currency: String,
}

impl HistoryEntry {
    /// Header written to a new history file, in this order.
    pub const COLUMNS: [&'static str; 5] = ["fecha", "producto", "precio", "url", "moneda"];

    #[must_use]
    pub fn from_record(record: &ProductRecord, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            title: record.title.clone(),
            price: record.price,
            source_url: record.source_url.clone(),
            currency: record.currency.clone(),
        }
    }

    /// The value this entry writes under `column`, or `None` for a column
    /// the history format does not have.
    #[must_use]
    pub fn column_value(&self, column: &str) -> Option<String> {
        match column.trim() {
            "fecha" => Some(self.timestamp.format(history_timestamp::FORMAT).to_string()),
            "producto" => Some(self.title.clone()),
            "precio" => Some(self.price.to_string()),
            "url" => Some(self.source_url.clone()),
            "moneda" => Some(self.currency.clone()),
            _ => None,
        }
    }
}

/// Timestamps are written as `YYYY-MM-DD HH:MM:SS`. Reading also accepts
/// fractional seconds, which older history files contain.
mod history_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f")
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            title: "iPhone 15 Pro 256GB".to_string(),
            price: 1_749_999,
            source_url: "https://www.mercadolibre.com.ar/p/MLA123".to_string(),
            currency: "ARS".to_string(),
        }
    }

    #[test]
    fn history_entry_copies_record_fields() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let entry = HistoryEntry::from_record(&record(), ts);
        assert_eq!(entry.title, "iPhone 15 Pro 256GB");
        assert_eq!(entry.price, 1_749_999);
        assert_eq!(entry.source_url, "https://www.mercadolibre.com.ar/p/MLA123");
        assert_eq!(entry.currency, "ARS");
        assert_eq!(entry.timestamp, ts);
    }

    #[test]
    fn column_values_match_serialized_fields() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let entry = HistoryEntry::from_record(&record(), ts);
        let row: Vec<String> = HistoryEntry::COLUMNS
            .iter()
            .map(|c| entry.column_value(c).unwrap())
            .collect();
        assert_eq!(
            row,
            vec![
                "2024-03-01 10:30:00",
                "iPhone 15 Pro 256GB",
                "1749999",
                "https://www.mercadolibre.com.ar/p/MLA123",
                "ARS",
            ]
        );
        assert_eq!(entry.column_value("notas"), None);
    }
}
