//! Reading the human-readable activity log written by the CLI's tracing
//! file layer.

use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::StoreError;

/// The last `n` lines of the log at `path`, oldest first.
///
/// A missing log yields no lines. Invalid UTF-8 is replaced rather than
/// rejected, since the file is only ever displayed.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file exists but cannot be read.
pub fn tail_lines(path: &Path, n: usize) -> Result<Vec<String>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    if n == 0 {
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(&bytes);
    let mut tail = VecDeque::with_capacity(n);
    for line in text.lines() {
        if tail.len() == n {
            tail.pop_front();
        }
        tail.push_back(line.to_owned());
    }
    Ok(tail.into())
}
