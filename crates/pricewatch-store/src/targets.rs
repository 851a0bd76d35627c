//! The persisted set of URLs scheduled for the next scrape run.
//!
//! Stored as a one-column CSV with a `url` header. Every write rewrites the
//! whole file through a temporary sibling and a rename, so a crash mid-write
//! leaves the previous list intact. Concurrent writers are not coordinated.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pricewatch_core::TargetUrl;

use crate::error::StoreError;

const URL_COLUMN: &str = "url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the existing list and add only URLs not already present.
    Append,
    /// Discard the existing list and store the new URLs as the whole set.
    Replace,
}

#[derive(Debug, Clone)]
pub struct TargetListStore {
    path: PathBuf,
}

impl TargetListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored URL in file order, deduplicated.
    ///
    /// A missing or empty file is an empty list. The column named `url` is
    /// read, or the first column when none is. Blank rows, unreadable rows
    /// and URLs outside the domain allowlist are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be opened or its
    /// header cannot be read.
    pub fn load_all(&self) -> Result<Vec<TargetUrl>, StoreError> {
        let mut reader = match csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::csv(&self.path, e)),
        };

        let headers = reader
            .headers()
            .map_err(|e| StoreError::csv(&self.path, e))?
            .clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(URL_COLUMN))
            .unwrap_or(0);

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), row, error = %e, "skipping unreadable target row");
                    continue;
                }
            };
            let Some(raw) = record.get(column).map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            match TargetUrl::parse(raw) {
                Some(url) => {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
                None => {
                    tracing::warn!(path = %self.path.display(), url = raw, "skipping unsupported target URL");
                }
            }
        }
        Ok(urls)
    }

    /// Merges `new_urls` into the stored list and returns how many URLs were
    /// added.
    ///
    /// With [`MergePolicy::Append`] existing entries keep their order and
    /// only genuinely new URLs are appended, in the order given. With
    /// [`MergePolicy::Replace`] the stored list becomes `new_urls` with
    /// duplicates removed, and the count is that list's length.
    ///
    /// Either way the file is rewritten as a single `url` column: extra
    /// columns and rows skipped by [`Self::load_all`] are not preserved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the list cannot be read or written.
    pub fn merge(&self, new_urls: &[TargetUrl], policy: MergePolicy) -> Result<usize, StoreError> {
        match policy {
            MergePolicy::Append => {
                let mut urls = self.load_all()?;
                let mut seen: HashSet<TargetUrl> = urls.iter().cloned().collect();
                let before = urls.len();
                for url in new_urls {
                    if seen.insert(url.clone()) {
                        urls.push(url.clone());
                    }
                }
                let added = urls.len() - before;
                self.write(&urls)?;
                Ok(added)
            }
            MergePolicy::Replace => self.save_all(new_urls),
        }
    }

    /// Overwrites the list with `urls`, dropping duplicates. Returns the
    /// number of URLs stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn save_all(&self, urls: &[TargetUrl]) -> Result<usize, StoreError> {
        let mut seen = HashSet::new();
        let unique: Vec<TargetUrl> = urls
            .iter()
            .filter(|u| seen.insert((*u).clone()))
            .cloned()
            .collect();
        self.write(&unique)?;
        Ok(unique.len())
    }

    /// Resets the list to a header-only file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.write(&[])
    }

    fn write(&self, urls: &[TargetUrl]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = tmp_path(&self.path);
        {
            let mut writer =
                csv::Writer::from_path(&tmp).map_err(|e| StoreError::csv(&tmp, e))?;
            writer
                .write_record([URL_COLUMN])
                .map_err(|e| StoreError::csv(&tmp, e))?;
            for url in urls {
                writer
                    .write_record([url.as_str()])
                    .map_err(|e| StoreError::csv(&tmp, e))?;
            }
            writer.flush().map_err(|e| StoreError::io(&tmp, e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), count = urls.len(), "target list written");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

pub(crate) fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
