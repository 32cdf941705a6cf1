//! Field extraction for a single result row
//!
//! Each field has an ordered selector chain; the first selector that yields
//! non-empty cleaned text wins. Email and phone fall back to regex matching
//! over the row markup when no selector matches.

use crate::browser::{Browser, ElementHandle};
use crate::config::SelectorConfig;
use crate::extract::text::{clean_text, extract_email, extract_phone, segment_after};
use crate::extract::{first_match, LeadRecord};
use crate::state::ExtractionTally;
use crate::{BrowserError, BrowserResult};
use thiserror::Error;

/// A row that could not be read at all
#[derive(Debug, Error)]
pub enum RowExtractionError {
    #[error("Row is no longer attached to the page: {0}")]
    Stale(BrowserError),

    #[error("Browser failed while reading row: {0}")]
    Browser(BrowserError),
}

impl From<BrowserError> for RowExtractionError {
    fn from(error: BrowserError) -> Self {
        match error {
            BrowserError::StaleElement(_) => Self::Stale(error),
            other => Self::Browser(other),
        }
    }
}

/// Builds a [`LeadRecord`] from a result row
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    selectors: SelectorConfig,
}

impl FieldExtractor {
    pub fn new(selectors: SelectorConfig) -> Self {
        Self { selectors }
    }

    /// Extracts one record and counts the attempt in `tally`
    ///
    /// A row with no recognizable fields still yields a (nameless) record;
    /// only a structural failure such as a stale handle is an error.
    pub async fn extract<B: Browser>(
        &self,
        browser: &B,
        row: ElementHandle,
        tally: &mut ExtractionTally,
    ) -> Result<LeadRecord, RowExtractionError> {
        match self.read_row(browser, row).await {
            Ok(record) => {
                tally.record_success();
                tracing::debug!("Extracted lead data for: {:?}", record.full_name);
                Ok(record)
            }
            Err(e) => {
                tally.record_error();
                Err(e.into())
            }
        }
    }

    async fn read_row<B: Browser>(
        &self,
        browser: &B,
        row: ElementHandle,
    ) -> BrowserResult<LeadRecord> {
        let markup = browser
            .attribute(row, "innerHTML")
            .await?
            .unwrap_or_default();
        let mut record = LeadRecord::default();

        if let Some(name) = first_text(browser, row, &self.selectors.name).await? {
            record.set_name(name);
        }

        record.email = first_match(&self.selectors.email, |selector| {
            email_at(browser, row, selector)
        })
        .await?
        .unwrap_or_else(|| extract_email(&markup));

        record.phone = match first_text(browser, row, &self.selectors.phone).await? {
            Some(phone) => phone,
            None => extract_phone(&markup),
        };

        record.linkedin_url = first_match(&self.selectors.linkedin, |selector| {
            href_at(browser, row, selector, |href| href.contains("linkedin.com"))
        })
        .await?
        .unwrap_or_default();

        record.job_title = first_text(browser, row, &self.selectors.job_title)
            .await?
            .unwrap_or_default();
        record.company_name = first_text(browser, row, &self.selectors.company)
            .await?
            .unwrap_or_default();
        record.location = first_text(browser, row, &self.selectors.location)
            .await?
            .unwrap_or_default();

        let marker = self.selectors.companies_path_segment.as_str();
        record.company_domain = first_match(&self.selectors.company_link, |selector| {
            company_slug_at(browser, row, selector, marker)
        })
        .await?
        .unwrap_or_default();

        record.raw_markup = markup;
        Ok(record)
    }
}

/// Cleaned text of the first selector in `selectors` that yields any
async fn first_text<B: Browser>(
    browser: &B,
    row: ElementHandle,
    selectors: &[String],
) -> BrowserResult<Option<String>> {
    first_match(selectors, |selector| text_at(browser, row, selector)).await
}

async fn text_at<B: Browser>(
    browser: &B,
    row: ElementHandle,
    selector: &str,
) -> BrowserResult<Option<String>> {
    let Some(element) = browser.find(selector, Some(row)).await? else {
        return Ok(None);
    };
    let text = clean_text(&browser.text(element).await?);
    Ok((!text.is_empty()).then_some(text))
}

/// Labeled email text, or the address of a `mailto:` link
async fn email_at<B: Browser>(
    browser: &B,
    row: ElementHandle,
    selector: &str,
) -> BrowserResult<Option<String>> {
    let Some(element) = browser.find(selector, Some(row)).await? else {
        return Ok(None);
    };

    let text = clean_text(&browser.text(element).await?);
    if text.contains('@') {
        return Ok(Some(text));
    }

    let address = browser
        .attribute(element, "href")
        .await?
        .and_then(|href| {
            href.strip_prefix("mailto:")
                .map(|rest| rest.split('?').next().unwrap_or_default().trim().to_string())
        })
        .filter(|address| address.contains('@'));
    Ok(address)
}

async fn href_at<B: Browser>(
    browser: &B,
    row: ElementHandle,
    selector: &str,
    accept: fn(&str) -> bool,
) -> BrowserResult<Option<String>> {
    let Some(element) = browser.find(selector, Some(row)).await? else {
        return Ok(None);
    };
    Ok(browser
        .attribute(element, "href")
        .await?
        .filter(|href| accept(href)))
}

async fn company_slug_at<B: Browser>(
    browser: &B,
    row: ElementHandle,
    selector: &str,
    marker: &str,
) -> BrowserResult<Option<String>> {
    let Some(element) = browser.find(selector, Some(row)).await? else {
        return Ok(None);
    };
    Ok(browser
        .attribute(element, "href")
        .await?
        .and_then(|href| segment_after(&href, marker)))
}
