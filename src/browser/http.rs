//! Script-less browser over reqwest
//!
//! Pages are fetched with a cookie-aware HTTP client that follows redirects,
//! so a redirect to a sign-in page shows up in [`Browser::current_location`]
//! the same way it would in a real browser. Scripts are not executed; clicks
//! only work on elements carrying an `href`.

use crate::browser::document::{Document, Tab};
use crate::browser::{Browser, BrowserLauncher, ElementHandle};
use crate::config::{HttpConfig, TimeoutConfig};
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Launches [`HttpBrowser`] sessions
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    http: HttpConfig,
    poll_interval: Duration,
}

impl HttpLauncher {
    pub fn new(http: HttpConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            http,
            poll_interval: timeouts.poll_interval(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    type Browser = HttpBrowser;

    async fn launch(&self) -> BrowserResult<HttpBrowser> {
        HttpBrowser::new(&self.http, self.poll_interval)
    }
}

/// Browsing session backed by an HTTP client
///
/// DOM reads go through [`super::Document`]: attribute lookups are served from
/// a per-page snapshot, while every `find`, `text` and markup read parses the
/// page again. Reading one row costs a few dozen parses of the page.
pub struct HttpBrowser {
    client: Client,
    jar: Arc<Jar>,
    tab: Tab,
    poll_interval: Duration,
}

impl HttpBrowser {
    /// Builds a session with its own cookie jar
    pub fn new(config: &HttpConfig, poll_interval: Duration) -> BrowserResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(Policy::limited(10))
            .cookie_provider(Arc::clone(&jar))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            tab: Tab::default(),
            poll_interval,
        })
    }

    fn resolve(&self, url: &str) -> BrowserResult<Url> {
        let resolved = match self.tab.document() {
            Ok(document) => document.resolve(url),
            Err(_) => Url::parse(url).ok(),
        };
        resolved.ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            message: "invalid URL".to_string(),
        })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.tab.ensure_open()?;
        let target = self.resolve(url)?;

        tracing::debug!("GET {}", target);
        let response = self.client.get(target.clone()).send().await.map_err(|e| {
            BrowserError::Navigation {
                url: target.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            // A browser still renders error pages; keep loading them
            tracing::debug!("{} answered HTTP {}", final_url, status.as_u16());
        }

        let body = response.text().await?;
        self.tab.load(Document::new(final_url, body));
        Ok(())
    }

    async fn current_location(&self) -> BrowserResult<String> {
        Ok(self.tab.document()?.url().to_string())
    }

    async fn execute_script(&mut self, script: &str) -> BrowserResult<Option<String>> {
        self.tab.evaluate(script)
    }

    async fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Vec<ElementHandle>> {
        self.tab.find_all(selector, scope)
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn click(&mut self, element: ElementHandle) -> BrowserResult<()> {
        let target = self.tab.link_target(element)?;
        self.navigate(target.as_str()).await
    }

    async fn scroll_into_view(&mut self, element: ElementHandle) -> BrowserResult<()> {
        self.tab.position(element).map(|_| ())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> BrowserResult<Option<String>> {
        self.tab.attribute(element, name)
    }

    async fn text(&self, element: ElementHandle) -> BrowserResult<String> {
        self.tab.text(element)
    }

    async fn add_cookie(&mut self, name: &str, value: &str, domain: &str) -> BrowserResult<()> {
        let host = domain.trim_start_matches('.');
        let origin = Url::parse(&format!("https://{}/", host)).map_err(|e| {
            BrowserError::Navigation {
                url: host.to_string(),
                message: e.to_string(),
            }
        })?;
        self.jar.add_cookie_str(
            &format!("{}={}; Domain={}; Path=/", name, value, domain),
            &origin,
        );
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.tab.close();
        Ok(())
    }
}
