//! Page harvester: every lead on the currently loaded page

use crate::browser::{Browser, ElementHandle, WaitCondition};
use crate::crawler::pacing::PacingController;
use crate::extract::{first_match, FieldExtractor, LeadRecord, RowExtractionError};
use crate::state::ExtractionTally;
use crate::{BrowserError, BrowserResult};
use std::time::Duration;

/// Reads the result rows of the current page into lead records
#[derive(Debug, Clone)]
pub struct PageHarvester {
    extractor: FieldExtractor,
    row_selectors: Vec<String>,
    rows_timeout: Duration,
}

impl PageHarvester {
    pub fn new(
        extractor: FieldExtractor,
        row_selectors: Vec<String>,
        rows_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            row_selectors,
            rows_timeout,
        }
    }

    /// Harvests the page that is loaded right now
    ///
    /// Waits (bounded) for rows to appear, then extracts each row in DOM
    /// order. Returns an empty batch when no row shows up in time. Failures
    /// on individual rows are logged and skipped; nameless records are dropped.
    pub async fn harvest_current_page<B: Browser>(
        &self,
        browser: &mut B,
        tally: &mut ExtractionTally,
        pacing: &mut PacingController,
    ) -> Vec<LeadRecord> {
        let any_row = WaitCondition::ElementPresent(self.row_selectors.join(", "));
        match browser.wait_until(&any_row, self.rows_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    "Page load timeout: no result rows after {:.1}s",
                    self.rows_timeout.as_secs_f64()
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Error waiting for result rows: {}", e);
                return Vec::new();
            }
        }

        let rows = match self.locate_rows(browser).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Error locating result rows: {}", e);
                return Vec::new();
            }
        };
        tracing::info!("Found {} lead elements on current page", rows.len());

        let mut leads = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            match self.harvest_row(browser, *row, tally).await {
                Ok(record) if record.is_lead() => {
                    tracing::info!(
                        target: "lead_harvest::metrics",
                        action = "lead_extracted",
                        has_email = !record.email.is_empty(),
                        has_phone = !record.phone.is_empty(),
                        "Extracted {}",
                        record.full_name
                    );
                    leads.push(record);
                }
                Ok(_) => tracing::debug!("Row {} has no name, skipping", i),
                Err(e) => tracing::warn!("Error processing lead element {}: {}", i, e),
            }

            if i + 1 < rows.len() {
                tokio::time::sleep(pacing.row_pause()).await;
            }
        }

        tracing::info!("Successfully scraped {} leads from current page", leads.len());
        leads
    }

    /// Result rows matched by the first row selector that matches anything
    pub async fn locate_rows<B: Browser>(&self, browser: &B) -> BrowserResult<Vec<ElementHandle>> {
        let rows = first_match(&self.row_selectors, |selector| async move {
            let found = browser.find_all(selector, None).await?;
            Ok::<_, BrowserError>((!found.is_empty()).then_some(found))
        })
        .await?;
        Ok(rows.unwrap_or_default())
    }

    async fn harvest_row<B: Browser>(
        &self,
        browser: &mut B,
        row: ElementHandle,
        tally: &mut ExtractionTally,
    ) -> Result<LeadRecord, RowExtractionError> {
        browser.scroll_into_view(row).await?;
        self.extractor.extract(&*browser, row, tally).await
    }
}
