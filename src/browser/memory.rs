//! In-memory browser over a fixed set of pages

use crate::browser::document::{Document, Tab};
use crate::browser::{Browser, BrowserLauncher, ElementHandle};
use crate::{BrowserError, BrowserResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// A site served from memory: pages keyed by absolute URL, plus redirects
///
/// Cloning shares the visit log, so a test can hand a clone to the crawler
/// and inspect what was loaded afterwards.
#[derive(Debug, Clone, Default)]
pub struct StaticSite {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(normalize(url), html.into());
        self
    }

    /// Makes `from` redirect to `to`
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(normalize(from), normalize(to));
        self
    }

    /// Final URLs loaded so far, in order
    pub fn visited(&self) -> Vec<String> {
        self.visits
            .lock()
            .map(|visits| visits.clone())
            .unwrap_or_default()
    }

    /// Opens a browsing session on this site
    pub fn open(&self) -> StaticBrowser {
        StaticBrowser {
            site: self.clone(),
            tab: Tab::default(),
            cookies: Vec::new(),
        }
    }

    fn lookup(&self, url: &Url) -> BrowserResult<(Url, String)> {
        let mut current = normalize(url.as_str());
        for _ in 0..MAX_REDIRECTS {
            match self.redirects.get(&current) {
                Some(target) => current = target.clone(),
                None => break,
            }
        }

        let html = self
            .pages
            .get(&current)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: current.clone(),
                message: "no such page".to_string(),
            })?;

        let final_url = Url::parse(&current).map_err(|e| BrowserError::Navigation {
            url: current.clone(),
            message: e.to_string(),
        })?;

        if let Ok(mut visits) = self.visits.lock() {
            visits.push(current);
        }

        Ok((final_url, html))
    }
}

#[async_trait]
impl BrowserLauncher for StaticSite {
    type Browser = StaticBrowser;

    async fn launch(&self) -> BrowserResult<StaticBrowser> {
        Ok(self.open())
    }
}

/// Browsing session over a [`StaticSite`]
#[derive(Debug)]
pub struct StaticBrowser {
    site: StaticSite,
    tab: Tab,
    cookies: Vec<(String, String, String)>,
}

impl StaticBrowser {
    /// Cookies added to this session as `(name, value, domain)`
    pub fn cookies(&self) -> &[(String, String, String)] {
        &self.cookies
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
impl Browser for StaticBrowser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.tab.ensure_open()?;
        let target = self.resolve(url)?;
        let (final_url, html) = self.site.lookup(&target)?;
        self.tab.load(Document::new(final_url, html));
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
        self.tab.ensure_open()?;
        self.cookies
            .push((name.to_string(), value.to_string(), domain.to_string()));
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.tab.close();
        Ok(())
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| url.to_string())
}
