//! Browser capability consumed by the crawl engine
//!
//! The crawler never talks to a rendering engine directly. It drives anything
//! that implements [`Browser`]: navigate, read the DOM, run a script, wait,
//! click. Two implementations ship with the crate:
//!
//! - [`HttpBrowser`] fetches markup over HTTP and evaluates selectors against
//!   it without running scripts
//! - [`StaticBrowser`] serves pages from an in-memory [`StaticSite`], for
//!   replaying saved result pages offline

mod document;
mod http;
mod memory;

pub use document::Document;
pub use http::{HttpBrowser, HttpLauncher};
pub use memory::{StaticBrowser, StaticSite};

use crate::BrowserResult;
use async_trait::async_trait;
use std::time::Duration;

/// Opaque reference to one element of the currently loaded page
///
/// A handle is only valid for the page it was found on; using it after a
/// navigation yields [`crate::BrowserError::StaleElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub(crate) generation: u64,
    pub(crate) index: usize,
}

impl ElementHandle {
    pub(crate) fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }
}

/// Something to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// The document reports `readyState == "complete"`
    DocumentReady,

    /// At least one element matches the selector
    ElementPresent(String),
}

/// Script that reports the document ready state
pub const READY_STATE_SCRIPT: &str = "return document.readyState";

/// Script that hides the `navigator.webdriver` automation flag
pub const MASK_AUTOMATION_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Default polling interval for [`Browser::wait_until`]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The set of page operations the crawl engine requires
#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads `url` and makes it the current page
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Location of the current page after any redirects
    async fn current_location(&self) -> BrowserResult<String>;

    /// Runs a script in the page and returns its result as text, if any
    async fn execute_script(&mut self, script: &str) -> BrowserResult<Option<String>>;

    /// All elements matching `selector`, in document order, optionally below `scope`
    async fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Vec<ElementHandle>>;

    /// First element matching `selector`, or `None` if nothing matches
    async fn find(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Option<ElementHandle>> {
        Ok(self.find_all(selector, scope).await?.into_iter().next())
    }

    /// Checks a wait condition once
    async fn condition_met(&mut self, condition: &WaitCondition) -> BrowserResult<bool> {
        match condition {
            WaitCondition::DocumentReady => Ok(self
                .execute_script(READY_STATE_SCRIPT)
                .await?
                .is_some_and(|state| state == "complete")),
            WaitCondition::ElementPresent(selector) => {
                Ok(self.find(selector, None).await?.is_some())
            }
        }
    }

    /// How often [`Browser::wait_until`] re-checks its condition
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Blocks until `condition` holds or `timeout` elapses
    ///
    /// Returns `Ok(false)` on timeout. Errors from individual checks end the
    /// wait early.
    async fn wait_until(
        &mut self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> BrowserResult<bool> {
        let interval = self.poll_interval();
        let polled = tokio::time::timeout(timeout, async {
            loop {
                if self.condition_met(condition).await? {
                    return Ok(true);
                }
                tokio::time::sleep(interval).await;
            }
        })
        .await;

        match polled {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }

    /// Activates an element (follows a link, presses a button)
    async fn click(&mut self, element: ElementHandle) -> BrowserResult<()>;

    /// Scrolls the element into the viewport
    async fn scroll_into_view(&mut self, element: ElementHandle) -> BrowserResult<()>;

    /// Reads an attribute; `innerHTML` and `outerHTML` return markup
    async fn attribute(&self, element: ElementHandle, name: &str) -> BrowserResult<Option<String>>;

    /// Text content of the element
    async fn text(&self, element: ElementHandle) -> BrowserResult<String>;

    /// Stores a cookie in the browsing context
    async fn add_cookie(&mut self, name: &str, value: &str, domain: &str) -> BrowserResult<()>;

    /// Tears the browsing session down; further calls fail
    async fn close(&mut self) -> BrowserResult<()>;
}

/// Creates browsing sessions, one per crawl
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Browser: Browser;

    async fn launch(&self) -> BrowserResult<Self::Browser>;
}
