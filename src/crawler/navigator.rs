//! Pagination: finding and activating the "next page" control

use crate::browser::{Browser, ElementHandle, WaitCondition};
use crate::extract::first_match;
use crate::BrowserError;
use std::time::Duration;
use thiserror::Error;

/// Next-page activation failed; ends the crawl like a missing control would
#[derive(Debug, Error)]
#[error("Next-page navigation failed: {0}")]
pub struct NavigationFailure(#[from] BrowserError);

/// Waits for the document to report ready, then for a fixed settle delay
///
/// Returns false when the ready signal did not arrive within `timeout`.
pub async fn wait_for_page_load<B: Browser>(
    browser: &mut B,
    timeout: Duration,
    settle: Duration,
) -> bool {
    let ready = match browser.wait_until(&WaitCondition::DocumentReady, timeout).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::warn!("Error waiting for page load: {}", e);
            false
        }
    };

    if ready {
        tokio::time::sleep(settle).await;
    } else {
        tracing::warn!("Page load timeout after {:.1}s", timeout.as_secs_f64());
    }
    ready
}

/// Whether an element looks visible and enabled, judged from its attributes
pub async fn is_interactable<B: Browser>(
    browser: &B,
    element: ElementHandle,
) -> Result<bool, BrowserError> {
    if browser.attribute(element, "disabled").await?.is_some()
        || browser.attribute(element, "hidden").await?.is_some()
    {
        return Ok(false);
    }

    if browser
        .attribute(element, "aria-disabled")
        .await?
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    {
        return Ok(false);
    }

    let style = browser
        .attribute(element, "style")
        .await?
        .unwrap_or_default()
        .to_ascii_lowercase()
        .replace(' ', "");
    Ok(!style.contains("display:none") && !style.contains("visibility:hidden"))
}

/// Moves the result list forward one page
#[derive(Debug, Clone)]
pub struct PaginationNavigator {
    next_selectors: Vec<String>,
    scroll_pause: Duration,
    page_load_timeout: Duration,
    settle: Duration,
}

impl PaginationNavigator {
    pub fn new(
        next_selectors: Vec<String>,
        scroll_pause: Duration,
        page_load_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            next_selectors,
            scroll_pause,
            page_load_timeout,
            settle,
        }
    }

    /// Activates the next-page control
    ///
    /// Returns false when no visible, enabled control exists (the last page)
    /// or when activating it failed.
    pub async fn advance<B: Browser>(&self, browser: &mut B) -> bool {
        match self.try_advance(browser).await {
            Ok(true) => {
                tracing::info!("Successfully navigated to next page");
                true
            }
            Ok(false) => {
                tracing::info!("No next page button found or available");
                false
            }
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    async fn try_advance<B: Browser>(&self, browser: &mut B) -> Result<bool, NavigationFailure> {
        let page: &B = browser;
        let control = first_match(&self.next_selectors, |selector| async move {
            let Some(element) = page.find(selector, None).await? else {
                return Ok(None);
            };
            Ok::<_, BrowserError>(is_interactable(page, element).await?.then_some(element))
        })
        .await?;

        let Some(control) = control else {
            return Ok(false);
        };

        browser.scroll_into_view(control).await?;
        tokio::time::sleep(self.scroll_pause).await;
        browser.click(control).await?;

        // A late load shows up as an empty harvest on the next page
        wait_for_page_load(browser, self.page_load_timeout, self.settle).await;
        Ok(true)
    }
}
