//! Fingerprint masking applied to every fresh page before navigation.

use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;

use crate::error::ScrapeError;

/// Desktop user agents rotated per page.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub const VIEWPORT: (u32, u32) = (1280, 800);

pub const LOCALE: &str = "es-AR";

const ACCEPT_LANGUAGE: &str = "es-AR,es;q=0.9";

/// Hides `navigator.webdriver` from page scripts.
pub const MASK_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

#[must_use]
pub fn pick_user_agent() -> &'static str {
    USER_AGENTS[rand::random_range(0..USER_AGENTS.len())]
}

/// Applies user agent, locale, viewport and the webdriver mask to `page`.
///
/// Must run before the first navigation: the init script only affects
/// documents created after it is registered.
pub(crate) async fn apply(page: &Page, user_agent: &str) -> Result<(), ScrapeError> {
    let mut ua = SetUserAgentOverrideParams::new(user_agent);
    ua.accept_language = Some(ACCEPT_LANGUAGE.to_owned());
    page.execute(ua).await.map_err(super::cdp_error)?;

    page.execute(SetLocaleOverrideParams {
        locale: Some(LOCALE.to_owned()),
    })
    .await
    .map_err(super::cdp_error)?;

    let (width, height) = VIEWPORT;
    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(width),
        i64::from(height),
        1.0,
        false,
    ))
    .await
    .map_err(super::cdp_error)?;

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        MASK_WEBDRIVER_SCRIPT,
    ))
    .await
    .map_err(super::cdp_error)?;

    Ok(())
}
