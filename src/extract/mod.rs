//! Lead extraction from result rows
//!
//! This module handles:
//! - The `LeadRecord` produced for each result row
//! - Selector chains per field, resolved with [`first_match`]
//! - Text cleaning and regex fallbacks over raw row markup

mod fields;
pub mod text;

pub use fields::{FieldExtractor, RowExtractionError};

use serde::{Deserialize, Serialize};
use std::future::Future;

/// One scraped contact/company record
///
/// Built once per result row and not modified afterwards. A record only counts
/// as a lead when `full_name` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin_url: String,
    pub job_title: String,
    pub seniority: String,
    pub department: String,
    pub company_name: String,
    pub company_domain: String,
    pub company_website: String,
    pub company_industry: String,
    pub company_size: String,
    pub company_location: String,
    pub company_linkedin: String,
    pub years_experience: u32,
    pub location: String,
    /// Row markup as loaded, kept for diagnosis
    pub raw_markup: String,
}

impl LeadRecord {
    /// True when the record carries a name and may be kept
    pub fn is_lead(&self) -> bool {
        !self.full_name.is_empty()
    }

    /// Sets the name fields from a cleaned full name
    ///
    /// The first whitespace-separated token becomes `first_name`, the rest
    /// `last_name`.
    pub fn set_name(&mut self, full_name: String) {
        let mut parts = full_name.split_whitespace();
        self.first_name = parts.next().unwrap_or_default().to_string();
        self.last_name = parts.collect::<Vec<_>>().join(" ");
        self.full_name = full_name;
    }
}

/// Evaluates candidates in order and returns the first value produced
///
/// `attempt` yields `Ok(None)` for "no match, try the next one"; an error stops
/// the search and is returned.
pub async fn first_match<I, T, E, F, Fut>(candidates: I, mut attempt: F) -> Result<Option<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for candidate in candidates {
        if let Some(found) = attempt(candidate).await? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
