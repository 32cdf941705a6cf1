//! Static DOM model shared by the built-in browsers
//!
//! Markup is kept as text because the parsed `scraper::Html` tree is neither
//! `Send` nor `Sync`. Plain attributes are snapshotted once per load; selector
//! queries, text and markup reads re-parse the page, so each of those costs a
//! full parse. Elements are addressed by their position in a document-order
//! walk, which is stable across parses of the same markup.

use crate::browser::{ElementHandle, READY_STATE_SCRIPT};
use crate::{BrowserError, BrowserResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// One loaded page
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    html: String,
    /// Attributes of every element, indexed by position
    attributes: Vec<Vec<(String, String)>>,
}

impl Document {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        let mut document = Self {
            url,
            html: html.into(),
            attributes: Vec::new(),
        };
        document.attributes = document.with_elements(|elements| {
            elements
                .iter()
                .map(|element| {
                    element
                        .value()
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect()
                })
                .collect()
        });
        document
    }

    /// Final location the markup was loaded from
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Resolves an href found on this page to an absolute URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }

    /// Positions of every element matching `selector`, in document order
    ///
    /// With a `scope`, only descendants of that element are considered.
    pub fn select(&self, selector: &str, scope: Option<usize>) -> BrowserResult<Vec<usize>> {
        let parsed = Selector::parse(selector)
            .map_err(|e| BrowserError::InvalidSelector(format!("{}: {:?}", selector, e)))?;

        self.with_elements(|elements| {
            let positions: HashMap<_, usize> = elements
                .iter()
                .enumerate()
                .map(|(position, element)| (element.id(), position))
                .collect();

            let matches: Vec<ElementRef<'_>> = match scope {
                Some(position) => elements
                    .get(position)
                    .ok_or(BrowserError::StaleElement(position))?
                    .select(&parsed)
                    .collect(),
                None => elements
                    .iter()
                    .filter(|element| parsed.matches(element))
                    .copied()
                    .collect(),
            };

            Ok(matches
                .iter()
                .filter_map(|element| positions.get(&element.id()).copied())
                .collect())
        })
    }

    /// Concatenated text content of an element
    pub fn text(&self, position: usize) -> BrowserResult<String> {
        self.with_elements(|elements| {
            elements
                .get(position)
                .map(|element| element.text().collect::<String>())
                .ok_or(BrowserError::StaleElement(position))
        })
    }

    /// Reads an attribute, with `innerHTML`/`outerHTML` mapped to markup
    pub fn attribute(&self, position: usize, name: &str) -> BrowserResult<Option<String>> {
        let attributes = self
            .attributes
            .get(position)
            .ok_or(BrowserError::StaleElement(position))?;
        if !matches!(name, "innerHTML" | "outerHTML" | "textContent") {
            return Ok(attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()));
        }

        self.with_elements(|elements| {
            let element = elements
                .get(position)
                .ok_or(BrowserError::StaleElement(position))?;

            Ok(match name {
                "innerHTML" => Some(element.inner_html()),
                "outerHTML" => Some(element.html()),
                _ => Some(element.text().collect()),
            })
        })
    }

    fn with_elements<T>(&self, f: impl FnOnce(&[ElementRef<'_>]) -> T) -> T {
        let html = Html::parse_document(&self.html);
        let elements: Vec<ElementRef<'_>> = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        f(&elements)
    }
}

/// Current page of a browsing session plus handle bookkeeping
///
/// Every load bumps the generation so handles from earlier pages are rejected.
#[derive(Debug, Default)]
pub(crate) struct Tab {
    current: Option<Document>,
    generation: u64,
    closed: bool,
}

impl Tab {
    pub(crate) fn load(&mut self, document: Document) {
        self.generation += 1;
        self.current = Some(document);
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.current = None;
    }

    pub(crate) fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn document(&self) -> BrowserResult<&Document> {
        self.ensure_open()?;
        self.current.as_ref().ok_or(BrowserError::NoPage)
    }

    /// Maps a handle to a position on the current page
    pub(crate) fn position(&self, handle: ElementHandle) -> BrowserResult<usize> {
        self.ensure_open()?;
        if handle.generation != self.generation || self.current.is_none() {
            return Err(BrowserError::StaleElement(handle.index));
        }
        Ok(handle.index)
    }

    pub(crate) fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Vec<ElementHandle>> {
        let scope = scope.map(|handle| self.position(handle)).transpose()?;
        let positions = self.document()?.select(selector, scope)?;
        Ok(positions
            .into_iter()
            .map(|position| ElementHandle::new(self.generation, position))
            .collect())
    }

    pub(crate) fn text(&self, handle: ElementHandle) -> BrowserResult<String> {
        let position = self.position(handle)?;
        self.document()?.text(position)
    }

    pub(crate) fn attribute(
        &self,
        handle: ElementHandle,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let position = self.position(handle)?;
        self.document()?.attribute(position, name)
    }

    /// Absolute target of a clickable element
    pub(crate) fn link_target(&self, handle: ElementHandle) -> BrowserResult<Url> {
        let href = self
            .attribute(handle, "href")?
            .ok_or_else(|| {
                BrowserError::Unsupported("click on an element without href".to_string())
            })?;
        let document = self.document()?;
        document.resolve(&href).ok_or_else(|| BrowserError::Navigation {
            url: href.clone(),
            message: format!("cannot resolve against {}", document.url()),
        })
    }

    /// Answers the handful of scripts a static page can evaluate
    pub(crate) fn evaluate(&self, script: &str) -> BrowserResult<Option<String>> {
        self.ensure_open()?;
        if script.trim() == READY_STATE_SCRIPT {
            let state = if self.current.is_some() { "complete" } else { "loading" };
            return Ok(Some(state.to_string()));
        }
        tracing::trace!("Ignoring script on static page: {}", script);
        Ok(None)
    }
}
