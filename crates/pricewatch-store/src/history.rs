//! Append-only price history log.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use pricewatch_core::{HistoryEntry, ProductRecord};

use crate::error::StoreError;
use crate::targets::is_not_found;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row per record, all stamped with `timestamp`. The header
    /// is written only when the file is new or empty; otherwise rows follow
    /// the existing header's column order. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HistoryHeader`] if an existing header does not
    /// name exactly the history columns, or another [`StoreError`] if the
    /// file cannot be opened or written.
    pub fn append(
        &self,
        records: &[ProductRecord],
        timestamp: NaiveDateTime,
    ) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len()
            == 0;
        let columns = if is_new {
            HistoryEntry::COLUMNS.map(str::to_owned).to_vec()
        } else {
            self.existing_columns()?
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(&columns)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        for record in records {
            let entry = HistoryEntry::from_record(record, timestamp);
            let row: Vec<String> = columns
                .iter()
                .map(|c| entry.column_value(c).unwrap_or_default())
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&self.path, e))?;

        tracing::info!(path = %self.path.display(), rows = records.len(), "history appended");
        Ok(records.len())
    }

    /// Header of an existing history file. Appends follow its column order,
    /// so files written with a different order stay consistent.
    fn existing_columns(&self) -> Result<Vec<String>, StoreError> {
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| StoreError::csv(&self.path, e))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::csv(&self.path, e))?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let mut sorted: Vec<&str> = columns.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let mut expected = HistoryEntry::COLUMNS;
        expected.sort_unstable();
        if sorted != expected {
            return Err(StoreError::HistoryHeader {
                path: self.path.display().to_string(),
                header: columns.join(","),
            });
        }
        Ok(columns)
    }

    /// Every readable entry in file order. A missing file is empty history;
    /// malformed rows are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be opened.
    pub fn load_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::csv(&self.path, e)),
        };

        let mut entries = Vec::new();
        for (row, entry) in reader.deserialize::<HistoryEntry>().enumerate() {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), row, error = %e, "skipping malformed history row");
                }
            }
        }
        Ok(entries)
    }

    /// Entries from the most recent run: those sharing the latest timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be read.
    pub fn latest_snapshot(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let entries = self.load_all()?;
        let Some(latest) = entries.iter().map(|e| e.timestamp).max() else {
            return Ok(Vec::new());
        };
        Ok(entries
            .into_iter()
            .filter(|e| e.timestamp == latest)
            .collect())
    }

    /// Deletes the history file. Clearing an absent history is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

/// Headline numbers for one history snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub tracked: usize,
    /// Mean price, rounded to the nearest whole unit.
    pub average_price: u64,
    pub lowest_price: u64,
    pub updated_at: NaiveDateTime,
}

impl HistorySummary {
    /// `None` for an empty snapshot.
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let updated_at = entries.iter().map(|e| e.timestamp).max()?;
        let lowest_price = entries.iter().map(|e| e.price).min()?;
        let tracked = entries.len();
        let total: u128 = entries.iter().map(|e| u128::from(e.price)).sum();
        let count = tracked as u128;
        let average = (total + count / 2) / count;
        Some(Self {
            tracked,
            average_price: u64::try_from(average).unwrap_or(u64::MAX),
            lowest_price,
            updated_at,
        })
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
