//! Price text normalization.

use crate::error::ScrapeError;

/// Reduces displayed price text to a whole-unit integer.
///
/// Every non-digit character is dropped, which removes thousands separators
/// (`.` and `,`), whitespace, and currency symbols alike. There is no
/// decimal-point detection: the marketplace renders the integer part in its
/// own element, so `"1.749.999"` is one million seven hundred forty-nine
/// thousand, not a fraction.
///
/// # Errors
///
/// Returns [`ScrapeError::MalformedPrice`] if no digits remain or the digits
/// overflow `u64`.
pub fn parse_price(raw: &str) -> Result<u64, ScrapeError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ScrapeError::MalformedPrice {
            raw: raw.to_owned(),
        });
    }
    digits.parse::<u64>().map_err(|_| ScrapeError::MalformedPrice {
        raw: raw.to_owned(),
    })
}
